use notification_cell::templates;

#[test]
fn booking_received_interpolates_display_fields() {
    let (subject, html) = templates::booking_received(
        "Pat Tester",
        "Dora Practitioner",
        "General consultation",
        "2025-01-10",
        "09:00",
    );

    assert!(subject.contains("General consultation"));
    assert!(html.contains("Pat Tester"));
    assert!(html.contains("Dora Practitioner"));
    assert!(html.contains("2025-01-10"));
    assert!(html.contains("09:00"));
}

#[test]
fn admin_alert_names_the_patient_and_slot() {
    let (subject, html) = templates::admin_booking_alert(
        "Pat Tester",
        "Dora Practitioner",
        "Checkup",
        "2025-01-10",
        "09:00",
    );

    assert!(subject.contains("2025-01-10"));
    assert!(html.contains("Pat Tester"));
    assert!(html.contains("Checkup"));
}

#[test]
fn approval_includes_meeting_link_only_when_present() {
    let (_, with_link) = templates::appointment_approved(
        "Pat Tester",
        "Dora Practitioner",
        "Teleconsultation",
        "2025-01-10",
        "09:00",
        Some("https://meet.example/room-1"),
    );
    assert!(with_link.contains("https://meet.example/room-1"));

    let (_, without_link) = templates::appointment_approved(
        "Pat Tester",
        "Dora Practitioner",
        "Checkup",
        "2025-01-10",
        "09:00",
        None,
    );
    assert!(!without_link.contains("Join here"));
}

#[test]
fn rejection_carries_the_mandatory_reason() {
    let (subject, html) = templates::appointment_rejected(
        "Pat Tester",
        "Checkup",
        "2025-01-10",
        "Doctor unavailable that week",
    );

    assert!(subject.contains("Checkup"));
    assert!(html.contains("Doctor unavailable that week"));
}
