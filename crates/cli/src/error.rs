use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
	#[error("device {0} not found (run `bpc devices` to list connected devices)")]
	DeviceNotFound(u32),

	#[error(transparent)]
	Client(#[from] bpc::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}
