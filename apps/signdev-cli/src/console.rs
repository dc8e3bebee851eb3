//! Terminal output

use crate::commands::status_column;
use chrono::Utc;
use signdev_client::{AuditTrail, Dashboard, Notifier};

/// Notices on stdout, failures on stderr
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn info(&self, message: &str) {
        println!("{}", message);
    }

    fn error(&self, message: &str) {
        eprintln!("{}", message);
    }
}

pub fn print_documents(dashboard: &Dashboard) {
    if let Some(placeholder) = dashboard.list_placeholder() {
        println!("{}", placeholder);
        return;
    }
    for doc in dashboard.documents() {
        println!("{}  {:<10} {}", doc.id, status_column(doc), doc.file_name);
    }
}

pub fn print_audit(trail: &AuditTrail) {
    println!("🕵️ Audit Trail");
    println!("{}", trail.view(Utc::now()));
}
