pub mod email;

/// Delivery channel for a rendered report.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn channel_name(&self) -> &'static str;

    async fn send_report(&self, subject: &str, html_body: &str) -> anyhow::Result<()>;
}
