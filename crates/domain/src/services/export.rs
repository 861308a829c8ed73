//! CSV export of an event's registrations.

use crate::models::registration::RegistrationWithChildren;

const HEADER: &[&str] = &[
    "Registration ID",
    "Status",
    "Parent Name",
    "Parent Email",
    "Parent Phone",
    "Child Name",
    "Child Age",
    "Child Checked In",
    "Attendance Confirmed",
    "Notes",
    "Registered At",
];

/// One row per child; a registration without children still gets one row
/// with the child columns left empty.
pub fn registration_rows(registrations: &[RegistrationWithChildren]) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for entry in registrations {
        let reg = &entry.registration;
        let parent = |child: [String; 3]| {
            let [name, age, checked_in] = child;
            vec![
                reg.id.to_string(),
                reg.status.to_string(),
                reg.parent_name.clone(),
                reg.parent_email.clone(),
                reg.parent_phone.clone().unwrap_or_default(),
                name,
                age,
                checked_in,
                yes_no(reg.attendance_confirmed),
                reg.notes.clone().unwrap_or_default(),
                reg.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]
        };

        if entry.children.is_empty() {
            rows.push(parent([String::new(), String::new(), String::new()]));
            continue;
        }

        for child in &entry.children {
            rows.push(parent([
                child.name.clone(),
                child.age.map(|a| a.to_string()).unwrap_or_default(),
                if child.attended { "Yes" } else { "No" }.to_string(),
            ]));
        }
    }

    rows
}

/// Builds the CSV document. Includes UTF-8 BOM for Excel compatibility.
pub fn registrations_csv(registrations: &[RegistrationWithChildren]) -> String {
    let mut csv = String::new();
    csv.push('\u{FEFF}');
    csv.push_str(&HEADER.join(","));
    csv.push('\n');

    for row in registration_rows(registrations) {
        let escaped: Vec<String> = row.iter().map(|v| escape_csv(v)).collect();
        csv.push_str(&escaped.join(","));
        csv.push('\n');
    }
    csv
}

/// Download file name for an event's export, e.g. `summer_fair_registrations.csv`.
pub fn export_filename(event_title: &str) -> String {
    format!(
        "{}_registrations.csv",
        shared::validation::safe_filename(event_title, "event")
    )
}

fn yes_no(value: Option<bool>) -> String {
    match value {
        Some(true) => "Yes".to_string(),
        Some(false) => "No".to_string(),
        None => String::new(),
    }
}

/// Escape a value for CSV output.
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r')
    {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::registration::{Registration, RegistrationChild, RegistrationStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn registration(name: &str) -> Registration {
        Registration {
            id: Uuid::new_v4(),
            event_id: Uuid::nil(),
            parent_name: name.to_string(),
            parent_email: "parent@example.com".to_string(),
            parent_phone: Some("07700 900123".to_string()),
            notes: None,
            status: RegistrationStatus::Confirmed,
            attended: None,
            attendance_confirmed: Some(true),
            attendance_confirmed_at: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn child(registration_id: Uuid, name: &str, age: Option<i32>) -> RegistrationChild {
        RegistrationChild {
            id: Uuid::new_v4(),
            registration_id,
            name: name.to_string(),
            age,
            attended: false,
            check_in_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_childless_registration_gets_one_row() {
        let entry = RegistrationWithChildren {
            registration: registration("No Kids"),
            children: vec![],
        };
        let rows = registration_rows(&[entry]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], "No Kids");
        assert_eq!(rows[0][5], "");
        assert_eq!(rows[0][6], "");
    }

    #[test]
    fn test_two_children_share_parent_fields() {
        let reg = registration("Two Kids");
        let id = reg.id;
        let entry = RegistrationWithChildren {
            registration: reg,
            children: vec![child(id, "Ada", Some(7)), child(id, "Ben", None)],
        };
        let rows = registration_rows(&[entry]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][..5], rows[1][..5]);
        assert_eq!(rows[0][5], "Ada");
        assert_eq!(rows[0][6], "7");
        assert_eq!(rows[1][5], "Ben");
        assert_eq!(rows[1][6], "");
    }

    #[test]
    fn test_csv_has_bom_and_header() {
        let csv = registrations_csv(&[]);
        assert!(csv.starts_with('\u{FEFF}'));
        assert!(csv.contains("Registration ID,Status,Parent Name"));
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn test_csv_escapes_values() {
        let mut reg = registration("Smith, Jo");
        reg.notes = Some("Says \"hi\"".to_string());
        let csv = registrations_csv(&[RegistrationWithChildren {
            registration: reg,
            children: vec![],
        }]);
        assert!(csv.contains("\"Smith, Jo\""));
        assert!(csv.contains("\"Says \"\"hi\"\"\""));
    }

    #[test]
    fn test_escape_csv_simple() {
        assert_eq!(escape_csv("hello"), "hello");
        assert_eq!(escape_csv("hello,world"), "\"hello,world\"");
        assert_eq!(escape_csv("hello\nworld"), "\"hello\nworld\"");
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename("Summer Fair 2025"), "summer_fair_2025_registrations.csv");
        assert_eq!(export_filename("***"), "event_registrations.csv");
    }
}
