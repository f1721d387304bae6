use crate::error::Error;
use async_trait::async_trait;
use config::{Actor, ViewMode};
use humansize::{BINARY, format_size};
use orchestrator::domain::AlertRecord;
use orchestrator::{ControlEvent, StatusReport, StatusTarget, Transport};
use std::fmt::Write as _;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Transport that prints status reports, alerts and command replies.
#[derive(Debug)]
pub struct ConsoleTransport<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleTransport<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub async fn write(&self, text: &str) -> Result<(), Error> {
        let mut out = self.out.lock().await;
        out.write_all(text.as_bytes()).await.map_err(Error::Console)?;
        if !text.ends_with('\n') {
            out.write_all(b"\n").await.map_err(Error::Console)?;
        }
        out.flush().await.map_err(Error::Console)
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Transport for ConsoleTransport<W> {
    async fn ready(&self) {}

    async fn publish_status(
        &self,
        report: &StatusReport,
        target: StatusTarget,
    ) -> Result<(), orchestrator::Error> {
        if target == StatusTarget::Fresh {
            debug!("posting a fresh status message");
        }
        self.write(&render_status(report))
            .await
            .map_err(|err| orchestrator::Error::Transport(err.to_string()))
    }

    async fn notify(&self, channel_id: u64, alert: &AlertRecord) -> Result<(), orchestrator::Error> {
        self.write(&render_alert(channel_id, alert))
            .await
            .map_err(|err| orchestrator::Error::Transport(err.to_string()))
    }
}

/// Forward every line of `input` to the engine as a command from `actor`.
/// Returns when `input` is exhausted or the engine stops listening.
pub async fn forward_commands<R: AsyncBufRead + Unpin>(
    input: R,
    actor: Actor,
    control_tx: mpsc::UnboundedSender<ControlEvent>,
    reply_tx: mpsc::UnboundedSender<String>,
) -> Result<(), Error> {
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.map_err(Error::Console)? {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        let event = ControlEvent::Command {
            actor: actor.clone(),
            text: text.to_string(),
            reply: reply_tx.clone(),
        };
        if control_tx.send(event).is_err() {
            break;
        }
    }
    info!("console input closed");
    Ok(())
}

pub fn render_alert(channel_id: u64, alert: &AlertRecord) -> String {
    format!(
        "[alert #{channel_id}] {} ({}: {:.2})",
        alert.message,
        alert.kind.as_str().to_ascii_uppercase(),
        alert.value
    )
}

pub fn render_status(report: &StatusReport) -> String {
    let snapshot = &report.snapshot;
    let rates = &report.rates;
    let mut text = String::new();

    if report.view_mode == ViewMode::Compact {
        let _ = write!(
            text,
            "[{}] cpu {:.1}% | mem {:.1}% | disk {:.1}% | net up {:.1} KB/s down {:.1} KB/s",
            report.color, snapshot.cpu_percent, snapshot.memory_percent, snapshot.disk_percent,
            rates.current.sent, rates.current.received
        );
        if snapshot.temperature_celsius > 0.0 {
            let _ = write!(text, " | temp {:.1}°C", snapshot.temperature_celsius);
        }
        text.push('\n');
        return text;
    }

    let details = &report.details;
    let _ = writeln!(
        text,
        "== Server stats [{}] {} ==",
        report.color,
        snapshot.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    match &details.cpu {
        Some(cpu) => {
            let _ = write!(
                text,
                "CPU:     {:.1}% {} ({} cores / {} threads",
                snapshot.cpu_percent, cpu.model, cpu.physical_cores, cpu.logical_cores
            );
            if let Some(mhz) = cpu.frequency_mhz {
                let _ = write!(text, ", {mhz} MHz");
            }
            text.push_str(")\n");
        }
        None => {
            let _ = writeln!(text, "CPU:     {:.1}%", snapshot.cpu_percent);
        }
    }
    let memory = &details.memory;
    let _ = writeln!(
        text,
        "Memory:  {:.1}% ({} / {}), swap {} / {}",
        snapshot.memory_percent,
        format_size(memory.used, BINARY),
        format_size(memory.total, BINARY),
        format_size(memory.swap_used, BINARY),
        format_size(memory.swap_total, BINARY),
    );
    match &details.disk {
        Some(disk) => {
            let _ = writeln!(
                text,
                "Disk:    {:.1}% ({} / {} on {})",
                snapshot.disk_percent,
                format_size(disk.used(), BINARY),
                format_size(disk.total, BINARY),
                disk.mount_point.display()
            );
        }
        None => {
            let _ = writeln!(text, "Disk:    {:.1}%", snapshot.disk_percent);
        }
    }
    if snapshot.temperature_celsius > 0.0 {
        let _ = writeln!(text, "Temp:    {:.1}°C", snapshot.temperature_celsius);
    }
    let _ = writeln!(
        text,
        "Network: up {:.1} KB/s (peak {:.1}), down {:.1} KB/s (peak {:.1}), total sent {} received {}",
        rates.current.sent,
        rates.peak.sent,
        rates.current.received,
        rates.peak.received,
        format_size(details.network_totals.bytes_sent, BINARY),
        format_size(details.network_totals.bytes_received, BINARY),
    );
    let _ = writeln!(text, "Uptime:  {}", format_uptime(details.uptime));

    if !details.top_processes.is_empty() {
        text.push_str("Top processes:\n");
        for process in &details.top_processes {
            let _ = writeln!(
                text,
                "  {:<24} cpu {:>5.1}%  mem {:>5.1}%",
                process.name, process.cpu_percent, process.memory_percent
            );
        }
    }
    if !details.services.is_empty() {
        text.push_str("Services:\n");
        for service in &details.services {
            let state = if service.is_active() { "up" } else { "down" };
            let _ = writeln!(text, "  {:<24} {state}", service.name);
        }
    }
    if !details.containers.is_empty() {
        text.push_str("Containers:\n");
        for container in &details.containers {
            let _ = writeln!(text, "  {:<24} {}", container.name, container.status);
        }
    }
    let _ = writeln!(
        text,
        "Updates every {}s",
        report.update_interval.as_secs()
    );
    text
}

/// `3d 4h 5m 6s`
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{}d {}h {}m {}s",
        secs / 86_400,
        secs % 86_400 / 3600,
        secs % 3600 / 60,
        secs % 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use config::{Color, MetricKind};
    use orchestrator::NetworkRates;
    use orchestrator::domain::{HostDetails, Snapshot};
    use pretty_assertions::assert_eq;

    fn report(view_mode: ViewMode) -> StatusReport {
        StatusReport {
            snapshot: Snapshot {
                cpu_percent: 12.5,
                memory_percent: 40.0,
                disk_percent: 70.25,
                temperature_celsius: 0.0,
                ..Snapshot::zeroed(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            },
            rates: NetworkRates::default(),
            details: HostDetails {
                uptime: Duration::from_secs(90_061),
                ..HostDetails::default()
            },
            view_mode,
            color: Color::GREEN,
            update_interval: Duration::from_secs(30),
        }
    }

    #[test]
    fn compact_is_one_line() {
        let text = render_status(&report(ViewMode::Compact));
        assert_eq!(text.lines().count(), 1);
        assert!(text.contains("cpu 12.5%"));
        assert!(!text.contains("temp"));
    }

    #[test]
    fn detailed_lists_uptime_and_interval() {
        let text = render_status(&report(ViewMode::Detailed));
        assert!(text.contains("Uptime:  1d 1h 1m 1s"));
        assert!(text.contains("Updates every 30s"));
        assert!(!text.contains("Top processes"));
    }

    #[tokio::test]
    async fn alerts_are_written_to_the_sink() {
        let console = ConsoleTransport::new(Vec::new());
        let snapshot = Snapshot {
            memory_percent: 91.0,
            ..Snapshot::zeroed(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
        };
        let alert = AlertRecord::exceeded(MetricKind::Memory, &snapshot);
        console.notify(7, &alert).await.unwrap();

        let written = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(
            written,
            "[alert #7] Memory usage is high: 91.0% (MEMORY: 91.00)\n"
        );
    }

    #[tokio::test]
    async fn stdin_lines_become_commands() {
        let input: &[u8] = b"!stats\n\n  !history 2h  \n";
        let (control_tx, mut control_rx) = mpsc::unbounded_channel();
        let (reply_tx, _reply_rx) = mpsc::unbounded_channel();
        let actor = Actor {
            id: 5,
            name: "console".into(),
            role_ids: Vec::new(),
        };

        forward_commands(input, actor, control_tx, reply_tx)
            .await
            .unwrap();

        let mut texts = Vec::new();
        while let Ok(ControlEvent::Command { text, actor, .. }) = control_rx.try_recv() {
            assert_eq!(actor.id, 5);
            texts.push(text);
        }
        assert_eq!(texts, vec!["!stats".to_string(), "!history 2h".to_string()]);
    }
}
