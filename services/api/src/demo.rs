use crate::infra::{InMemoryMailTransport, InMemoryTimelineEventRepository};
use chrono::{Local, NaiveDate};
use clap::Args;
use incubator_admin::config::AppConfig;
use incubator_admin::error::AppError;
use incubator_admin::notifications::{
    AdminUser, Founder, StartupContact, StartupFeedback, StartupMailer, StartupNotification,
};
use incubator_admin::workflows::timeline::{
    LinkDraft, LinkLocator, NewTimelineEvent, StartupId, TimelineEvent, TimelineEventService,
    TimelineEventView,
};
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Startup identifier the demo event is attached to.
    #[arg(long, default_value = "rocket-boots")]
    pub(crate) startup_id: String,
    /// Milestone date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) event_on: Option<NaiveDate>,
    /// Skip the founder notification portion of the demo.
    #[arg(long)]
    pub(crate) skip_notification: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        startup_id,
        event_on,
        skip_notification,
    } = args;

    let config = AppConfig::load()?;
    let event_on = event_on.unwrap_or_else(|| Local::now().date_naive());
    let repository = Arc::new(InMemoryTimelineEventRepository::default());
    let service = TimelineEventService::new(repository);

    println!("Timeline review demo");
    let event = service.create(NewTimelineEvent {
        startup_id: StartupId(startup_id.clone()),
        event_type: "Prototype Launched".to_string(),
        description: "First working prototype shipped to pilot customers.".to_string(),
        event_on,
    })?;
    render_event("Created", &event);

    service.add_link(&event.id, None, LinkDraft::new("Docs", "http://a", false))?;
    let event = service.add_link(&event.id, None, LinkDraft::new("Deck", "http://b", true))?;
    render_event("Links attached", &event);

    let (event, removed) = service.delete_link(&event.id, None, LinkLocator::Index(0))?;
    println!("  Removed link '{}' at position 0", removed.title);
    render_event("After delete", &event);

    match service.edit_link(
        &event.id,
        Some(event.version),
        LinkLocator::Index(5),
        LinkDraft::new("Press", "http://c", false),
    ) {
        Ok(_) => println!("  Unexpected edit of a missing position"),
        Err(err) => println!("  Edit rejected: {err}"),
    }

    let event = service.mark_needs_improvement(&event.id, Some(event.version))?;
    render_event("Reviewed", &event);

    let event = service.verify(&event.id, Some(event.version))?;
    render_event("Re-reviewed", &event);

    match service.unverify(&event.id, Some(event.version.saturating_sub(1))) {
        Ok(_) => println!("  Stale write unexpectedly accepted"),
        Err(err) => println!("  Stale write rejected: {err}"),
    }

    match serde_json::to_string_pretty(&TimelineEventView::from_event(&event)) {
        Ok(json) => println!("  Admin payload:\n{}", json),
        Err(err) => println!("  Admin payload unavailable: {}", err),
    }

    if skip_notification {
        return Ok(());
    }

    println!("\nFounder notification demo");
    let transport = Arc::new(InMemoryMailTransport::default());
    let mailer = StartupMailer::new(transport.clone(), config.mailer.from.clone());
    let startup = StartupContact {
        id: StartupId(startup_id.clone()),
        product_name: "Rocket Boots".to_string(),
        name: Some("Acme Labs".to_string()),
        founders: vec![
            Founder {
                fullname: "Asha Menon".to_string(),
                email: "asha@acme.test".to_string(),
            },
            Founder {
                fullname: "Vivek Rao".to_string(),
                email: "vivek@acme.test".to_string(),
            },
        ],
    };

    let feedback = StartupNotification::Feedback {
        feedback: StartupFeedback {
            id: "fb-demo".to_string(),
            feedback: "Great traction. Add the pilot results to the deck.".to_string(),
            reference_url: Some(
                config
                    .mailer
                    .timeline_entry_url(&startup_id, &event.id.0),
            ),
        },
        sender: AdminUser {
            email: "team@startupvillage.in".to_string(),
        },
    };

    for notification in [StartupNotification::StartupApproved, feedback] {
        if let Err(err) = mailer.deliver(&startup, &notification) {
            println!("  Delivery failed: {}", err);
        }
    }

    for email in transport.outbox() {
        println!("- {} -> {}", email.subject, email.to.join(", "));
        if let Some(reply_to) = &email.reply_to {
            println!("  reply-to: {}", reply_to);
        }
        if let Some(reference) = email.variables.get("reference_url") {
            println!("  reference: {}", reference);
        }
    }

    Ok(())
}

fn render_event(stage: &str, event: &TimelineEvent) {
    let view = TimelineEventView::from_event(event);
    println!(
        "- {stage}: {} [{}] v{} ({} link(s))",
        view.id.0,
        view.verified_status,
        view.version,
        view.links.len()
    );
    for (position, link) in view.links.iter().enumerate() {
        let visibility = if link.private { "private" } else { "public" };
        println!("    {position}. {} <{}> ({visibility})", link.title, link.url);
    }
}
