use handyhub_core::{format_distance, format_duration, RequestStatus, ServiceRequest};
use handyhub_db::RequestStore;

const NAME_WIDTH: usize = 24;

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        format!("{}...", value.chars().take(width - 3).collect::<String>())
    } else {
        value.to_string()
    }
}

fn format_travel(request: &ServiceRequest) -> String {
    match (request.estimated_distance, request.estimated_travel_time) {
        (Some(miles), Some(minutes)) => {
            format!("{} / {}", format_distance(miles), format_duration(minutes))
        }
        (Some(miles), None) => format_distance(miles),
        _ => "-".to_string(),
    }
}

fn format_row(request: &ServiceRequest) -> String {
    format!(
        "{:<6}{:<13}{:<11}{:<26}{:<22}{:<18}{}",
        request.id,
        request.status.as_str(),
        request.service_tier.as_str(),
        truncate(&request.client_name, NAME_WIDTH),
        truncate(&request.service_type, 20),
        request.created_at.format("%Y-%m-%d %H:%M"),
        format_travel(request)
    )
}

/// Print requests as a table, newest first.
///
/// # Errors
///
/// Returns an error if the store cannot be read.
pub(crate) async fn run_list(
    store: &dyn RequestStore,
    status: Option<RequestStatus>,
    search: Option<&str>,
) -> anyhow::Result<()> {
    let mut requests = store.list(status).await?;
    if let Some(term) = search {
        requests.retain(|r| r.matches_search(term));
    }

    if requests.is_empty() {
        println!(
            "no service requests found{}",
            status.map(|s| format!(" with status {s}")).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<6}{:<13}{:<11}{:<26}{:<22}{:<18}TRAVEL",
        "ID", "STATUS", "TIER", "CLIENT", "SERVICE", "CREATED"
    );
    for request in &requests {
        println!("{}", format_row(request));
    }
    Ok(())
}

/// Move a request to `status`, reporting what is allowed when the move is not.
///
/// # Errors
///
/// Returns an error if the request does not exist, the transition is not
/// allowed, or the store fails.
pub(crate) async fn run_set_status(
    store: &dyn RequestStore,
    id: &str,
    status: RequestStatus,
) -> anyhow::Result<()> {
    let current = store.get(id).await?;
    if current.status != status && !current.status.can_transition_to(status) {
        let allowed: Vec<&str> = current
            .status
            .next_statuses()
            .iter()
            .map(|s| s.as_str())
            .collect();
        anyhow::bail!(
            "cannot move request {id} from {} to {status}; allowed: {}",
            current.status,
            if allowed.is_empty() {
                "none (terminal)".to_string()
            } else {
                allowed.join(", ")
            }
        );
    }

    let updated = store
        .update(id, handyhub_core::ServiceRequestPatch::status(status))
        .await?;
    tracing::info!(id = %updated.id, status = %updated.status, "status updated");
    println!("request {} is now {}", updated.id, updated.status);
    Ok(())
}
