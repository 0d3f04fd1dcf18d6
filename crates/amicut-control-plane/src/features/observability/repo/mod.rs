use prometheus::{opts, CounterVec, Encoder, HistogramOpts, HistogramVec, Registry, TextEncoder};

pub struct ObservabilityRepository {
    registry: Registry,
    command_total: CounterVec,
    command_latency_seconds: HistogramVec,
    edp_resolution_total: CounterVec,
    build_dispatch_total: CounterVec,
}

impl ObservabilityRepository {
    pub fn new() -> Result<Self, String> {
        let registry = Registry::new();

        let command_total = CounterVec::new(
            opts!("amicut_command_total", "Commands handled"),
            &["command", "status"],
        )
        .map_err(|e| e.to_string())?;
        let command_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "amicut_command_latency_seconds",
                "Command handling latency (seconds)",
            ),
            &["command"],
        )
        .map_err(|e| e.to_string())?;
        let edp_resolution_total = CounterVec::new(
            opts!(
                "amicut_edp_resolution_total",
                "Live image resolutions by outcome (found / none / ambiguous)"
            ),
            &["outcome"],
        )
        .map_err(|e| e.to_string())?;
        let build_dispatch_total = CounterVec::new(
            opts!(
                "amicut_build_dispatch_total",
                "Build dispatches by outcome (previewed / triggered / rejected / failed)"
            ),
            &["outcome"],
        )
        .map_err(|e| e.to_string())?;

        registry
            .register(Box::new(command_total.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(command_latency_seconds.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(edp_resolution_total.clone()))
            .map_err(|e| e.to_string())?;
        registry
            .register(Box::new(build_dispatch_total.clone()))
            .map_err(|e| e.to_string())?;

        Ok(Self {
            registry,
            command_total,
            command_latency_seconds,
            edp_resolution_total,
            build_dispatch_total,
        })
    }

    pub fn observe_command(&self, command: &str, status: &str, seconds: f64) {
        self.command_total
            .with_label_values(&[command, status])
            .inc();
        self.command_latency_seconds
            .with_label_values(&[command])
            .observe(seconds);
    }

    pub fn inc_edp_resolution(&self, outcome: &str) {
        self.edp_resolution_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn inc_build_dispatch(&self, outcome: &str) {
        self.build_dispatch_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn render_metrics(&self) -> Result<String, String> {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| e.to_string())?;
        String::from_utf8(buffer).map_err(|e| e.to_string())
    }
}
