//! Runtime status
//!
//! - GET /api/admin/system - version, uptime, request stats, memory, database, schema
//! - GET /health - public liveness check

use axum::{extract::State, Json};
use serde::Serialize;
use sysinfo::{Pid, System};

use super::middleware::AppState;
use crate::db::migrations;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub uptime_formatted: String,
    pub total_requests: u64,
    /// Average response time in milliseconds
    pub avg_response_time_ms: f64,
    /// Resident memory of this process
    pub memory_bytes: u64,
    pub memory_formatted: String,
    pub os_name: String,
    /// `ok`, or `error` when the ping failed
    pub database: &'static str,
    /// Migrations not yet applied; `None` when the check failed
    pub pending_migrations: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub async fn system_status(State(state): State<AppState>) -> Json<SystemStatusResponse> {
    let memory_bytes = tokio::task::spawn_blocking(process_memory)
        .await
        .unwrap_or(0);

    let database = match state.pool.ping().await {
        Ok(()) => "ok",
        Err(e) => {
            tracing::error!("Database ping failed: {:#}", e);
            "error"
        }
    };

    let pending_migrations = match migrations::pending_count(&state.pool).await {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::error!("Failed to count pending migrations: {:#}", e);
            None
        }
    };

    let uptime_seconds = state.request_stats.uptime_seconds();
    Json(SystemStatusResponse {
        version: APP_VERSION.to_string(),
        uptime_seconds,
        uptime_formatted: format_uptime(uptime_seconds),
        total_requests: state.request_stats.total_requests(),
        avg_response_time_ms: state.request_stats.avg_response_time_us() / 1000.0,
        memory_bytes,
        memory_formatted: format_bytes(memory_bytes),
        os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
        database,
        pending_migrations,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

fn process_memory() -> u64 {
    let mut sys = System::new_all();
    sys.refresh_all();
    let pid = Pid::from_u32(std::process::id());
    sys.process(pid).map(|p| p.memory()).unwrap_or(0)
}

fn format_uptime(seconds: u64) -> String {
    let days = seconds / 86400;
    let hours = (seconds % 86400) / 3600;
    let minutes = (seconds % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", seconds)
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42), "42s");
        assert_eq!(format_uptime(125), "2m");
        assert_eq!(format_uptime(2 * 3600 + 15 * 60), "2h 15m");
        assert_eq!(format_uptime(86400 + 3600), "1d 1h 0m");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.00 KB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.00 MB");
    }
}
