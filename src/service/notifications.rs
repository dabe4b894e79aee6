use anyhow::Result;

pub const PAYMENT_SUCCESSFUL_EVENT: &str = "payment_successful_view";
pub const PAYMENT_UNSUCCESSFUL_EVENT: &str = "payment_unsuccessful_view";

/// Best-effort, fire-and-forget delivery of post-order side effects:
/// campaign analytics events and enrollment/COD confirmation mail triggers.
/// Failures are logged and swallowed; nothing here ever changes an outcome
/// already decided by the postback flow. Unconfigured targets make the
/// dispatcher a no-op.
#[derive(Clone)]
pub struct NotificationDispatcher {
    pub client: reqwest::Client,
    pub campaign_event_url: Option<String>,
    pub campaign_account_id: Option<String>,
    pub campaign_key: Option<String>,
    pub notification_api_url: Option<String>,
}

impl NotificationDispatcher {
    pub fn disabled() -> Self {
        Self {
            client: reqwest::Client::new(),
            campaign_event_url: None,
            campaign_account_id: None,
            campaign_key: None,
            notification_api_url: None,
        }
    }

    pub fn spawn_campaign_event(
        &self,
        event_name: &'static str,
        email: String,
        course_id: Option<String>,
    ) {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            if let Err(err) = dispatcher.send_campaign_event(event_name, &email, course_id).await {
                tracing::warn!("campaign event [{}] failed: {}", event_name, err);
            }
        });
    }

    async fn send_campaign_event(
        &self,
        event_name: &str,
        email: &str,
        course_id: Option<String>,
    ) -> Result<()> {
        let (Some(url), Some(account_id), Some(key)) = (
            &self.campaign_event_url,
            &self.campaign_account_id,
            &self.campaign_key,
        ) else {
            return Ok(());
        };

        let mut event_data = serde_json::json!({ "email": email });
        if let Some(course_id) = course_id {
            event_data["course_id"] = serde_json::Value::String(course_id);
        }

        let form = [
            ("actid", account_id.as_str()),
            ("key", key.as_str()),
            ("event", event_name),
            ("eventdata", &event_data.to_string()),
        ];

        self.client.post(url).form(&form).send().await?;
        Ok(())
    }

    /// Enrollment confirmation mail for a completed order.
    pub fn spawn_enrollment_mail(&self, username: String, course_id: Option<String>) {
        self.spawn_mail_trigger("enrollment_mail", username, course_id, None);
    }

    /// COD order confirmation mail including the courier tracking number.
    pub fn spawn_cod_order_mail(
        &self,
        username: String,
        course_id: Option<String>,
        tracking_id: String,
    ) {
        self.spawn_mail_trigger("cod_order_mail", username, course_id, Some(tracking_id));
    }

    fn spawn_mail_trigger(
        &self,
        resource: &'static str,
        username: String,
        course_id: Option<String>,
        tracking_id: Option<String>,
    ) {
        let Some(api_url) = self.notification_api_url.clone() else {
            return;
        };
        let client = self.client.clone();
        let course_id = course_id.unwrap_or_default();

        tokio::spawn(async move {
            let endpoint = match tracking_id {
                Some(tracking) => {
                    format!("{}/{}/{}/{}/{}", api_url, resource, username, course_id, tracking)
                }
                None => format!("{}/{}/{}/{}", api_url, resource, username, course_id),
            };
            if let Err(err) = client.get(&endpoint).send().await {
                tracing::warn!("failed to trigger [{}] for [{}]: {}", resource, username, err);
            }
        });
    }
}
