// libs/notification-cell/src/services/templates.rs
//
// Fixed HTML bodies rendered by plain string interpolation. One function
// per notification kind; callers pass display fields only.

pub fn booking_received(
    patient_name: &str,
    doctor_name: &str,
    service_name: &str,
    date: &str,
    start_time: &str,
) -> (String, String) {
    let subject = format!("We received your appointment request for {}", service_name);
    let html = format!(
        "<html><body>\
         <h2>Thank you, {patient_name}</h2>\
         <p>Your request for <strong>{service_name}</strong> with Dr. {doctor_name} \
         on <strong>{date}</strong> at <strong>{start_time}</strong> has been received.</p>\
         <p>You will get another email once the clinic confirms your appointment.</p>\
         </body></html>"
    );
    (subject, html)
}

pub fn admin_booking_alert(
    patient_name: &str,
    doctor_name: &str,
    service_name: &str,
    date: &str,
    start_time: &str,
) -> (String, String) {
    let subject = format!("New appointment request: {} on {}", service_name, date);
    let html = format!(
        "<html><body>\
         <h2>New booking awaiting review</h2>\
         <p>{patient_name} requested <strong>{service_name}</strong> with \
         Dr. {doctor_name} on <strong>{date}</strong> at <strong>{start_time}</strong>.</p>\
         <p>Review it from the admin dashboard to approve or reject.</p>\
         </body></html>"
    );
    (subject, html)
}

pub fn appointment_approved(
    patient_name: &str,
    doctor_name: &str,
    service_name: &str,
    date: &str,
    start_time: &str,
    meeting_link: Option<&str>,
) -> (String, String) {
    let subject = format!("Your {} appointment is confirmed", service_name);
    let meeting_block = match meeting_link {
        Some(link) => format!(
            "<p>This is an online appointment. Join here: <a href=\"{link}\">{link}</a></p>"
        ),
        None => String::new(),
    };
    let html = format!(
        "<html><body>\
         <h2>Appointment confirmed</h2>\
         <p>Hi {patient_name}, your <strong>{service_name}</strong> appointment with \
         Dr. {doctor_name} is confirmed for <strong>{date}</strong> at \
         <strong>{start_time}</strong>.</p>\
         {meeting_block}\
         </body></html>"
    );
    (subject, html)
}

pub fn appointment_rejected(
    patient_name: &str,
    service_name: &str,
    date: &str,
    reason: &str,
) -> (String, String) {
    let subject = format!("Update on your {} appointment request", service_name);
    let html = format!(
        "<html><body>\
         <h2>Appointment request declined</h2>\
         <p>Hi {patient_name}, unfortunately your <strong>{service_name}</strong> \
         request for <strong>{date}</strong> could not be accommodated.</p>\
         <p>Reason: {reason}</p>\
         <p>Please book another time from the portal.</p>\
         </body></html>"
    );
    (subject, html)
}
