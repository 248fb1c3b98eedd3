use clap::Parser;

/// Command-line arguments for the capture agent.
///
/// The bucket is the only required value; everything else has a default
/// matching a Raspberry Pi with a USB webcam on `/dev/video0`.
#[derive(Parser, Debug)]
#[clap(name = "capture-agent", about = "Periodic webcam capture and S3 upload agent")]
pub struct Args {
    /// S3 bucket receiving the captured frames
    #[clap(short, long)]
    pub bucket: String,

    /// Days until uploaded frames expire (0 disables expiration)
    #[clap(short, long, default_value = "7")]
    pub ttl_days: i32,

    /// Key prefix (folder) for uploaded frames
    #[clap(short, long, default_value = "images")]
    pub folder: String,

    /// Seconds between capture cycles
    #[clap(short, long, default_value = "30")]
    pub interval: u64,

    /// Video device to capture from
    #[clap(short, long, default_value = "/dev/video0")]
    pub device: String,

    /// Capture resolution as WIDTHxHEIGHT
    #[clap(short, long, default_value = "800x600")]
    pub resolution: String,

    /// AWS credentials: a profile name, or an explicit "KEY|SECRET" pair.
    /// Falls back to AWS_ACCESS_KEY_ID/AWS_SECRET_ACCESS_KEY when omitted.
    #[clap(short, long)]
    pub credentials: Option<String>,

    /// AWS region for the bucket
    #[clap(long, default_value = "us-east-1")]
    pub region: String,

    /// Custom S3 endpoint URL (MinIO, LocalStack)
    #[clap(long)]
    pub endpoint_url: Option<String>,

    /// Force path-style S3 addressing (required for MinIO)
    #[clap(long)]
    pub force_path_style: bool,

    /// Log level (trace, debug, info, warn, error)
    #[clap(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[clap(long)]
    pub log_json: bool,

    /// Port for the Prometheus metrics exporter
    #[clap(long, default_value = "9090")]
    pub metrics_port: u16,
}
