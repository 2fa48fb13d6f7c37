use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tokio_test::assert_ok;
use ulid::Ulid;

use tutorbook::engine::{
    AdminAlert, CancelActor, Intent, assign, cancel, create_booking, finalize, hard_confirm,
    mark_notified, reassign, tutor_accept, tutor_decline,
};
use tutorbook::model::*;
use tutorbook::notify::{DeliveryError, IntentHub, IntentSink, deliver_all};
use tutorbook::roster::Roster;

// ── Test infrastructure ──────────────────────────────────────

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    d(y, m, day).and_time(t(h, min))
}

fn now() -> NaiveDateTime {
    dt(2026, 5, 20, 10, 0)
}

fn tutor(role: Role, languages: &[Language]) -> Tutor {
    Tutor {
        id: Ulid::new(),
        name: "Nomsa".into(),
        surname: "Khumalo".into(),
        phone: "082 444 9876".into(),
        email: "nomsa@example.com".into(),
        town: "Soweto".into(),
        approved: true,
        role,
        languages: languages.iter().copied().collect::<BTreeSet<_>>(),
        has_transport: true,
    }
}

fn request(required_role: Role, subject: &str) -> BookingRequest {
    BookingRequest {
        parent_id: Ulid::new(),
        child_name: "Sibusiso".into(),
        grade: "12".into(),
        school: "Greenfields Academy".into(),
        subject: subject.into(),
        required_role,
        exam_date: d(2026, 6, 2),
        start_time: t(9, 0),
        duration_minutes: 180,
        extra_time_minutes: 30,
    }
}

async fn recv_intent(rx: &mut tokio::sync::broadcast::Receiver<Intent>) -> Intent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("no intent within timeout")
        .unwrap()
}

struct RecordingSink {
    delivered: Mutex<Vec<Intent>>,
}

#[async_trait]
impl IntentSink for RecordingSink {
    async fn deliver(&self, intent: &Intent) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(intent.clone());
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────

#[tokio::test]
async fn assign_accept_finalize_through_hub() {
    let _ = tracing_subscriber::fmt::try_init();

    let roster = Roster::new();
    let reader = tutor(Role::Reader, &[Language::Afrikaans]);
    let wrong_role = tutor(Role::Invigilator, &[Language::Afrikaans]);
    let busy = tutor(Role::Reader, &[Language::Afrikaans]);
    roster.add_tutor(reader.clone()).unwrap();
    roster.add_tutor(wrong_role).unwrap();
    roster.add_tutor(busy.clone()).unwrap();
    roster
        .add_window(UnavailabilityWindow {
            id: Ulid::new(),
            tutor_id: busy.id,
            start_date: d(2026, 6, 1),
            end_date: d(2026, 6, 3),
            start_time: None,
            end_time: None,
            reason: Some("invigilating elsewhere".into()),
        })
        .unwrap();

    let booking = assert_ok!(create_booking(request(Role::Reader, "Afrikaans"), now()));
    let hub = Arc::new(IntentHub::new());
    let mut rx = hub.subscribe(booking.id);

    // Only the free Afrikaans reader qualifies.
    let candidates = roster.candidates(&booking);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id, reader.id);

    let assigned = assert_ok!(assign(
        booking,
        &candidates[0],
        &roster.all_windows(),
        now()
    ));
    hub.publish(&assigned.intents);
    let intent = recv_intent(&mut rx).await;
    assert!(matches!(
        intent,
        Intent::NotifyTutor { tutor_id, .. } if tutor_id == reader.id
    ));

    let awaiting = mark_notified(assigned.booking).unwrap();
    let accepted = tutor_accept(awaiting.booking).unwrap();
    hub.publish(&accepted.intents);
    assert!(matches!(
        recv_intent(&mut rx).await,
        Intent::NotifyAdmin {
            alert: AdminAlert::TutorAccepted,
            ..
        }
    ));

    let confirmed = finalize(accepted.booking, &reader, dt(2026, 5, 21, 9, 0)).unwrap();
    hub.publish(&confirmed.intents);
    match recv_intent(&mut rx).await {
        Intent::NotifyParent {
            tutor: Some(contact),
            ..
        } => {
            assert_eq!(contact.name, "Nomsa Khumalo");
            assert_eq!(contact.email, "nomsa@example.com");
        }
        other => panic!("expected parent notification, got {other:?}"),
    }

    assert_eq!(confirmed.booking.status, BookingStatus::Confirmed);
    hub.remove(&confirmed.booking.id);
}

#[tokio::test]
async fn hard_confirm_notifies_both_parties() {
    let booking = create_booking(request(Role::Scribe, "English"), now()).unwrap();
    let scribe = tutor(Role::Scribe, &[]);

    let hub = IntentHub::new();
    let mut rx = hub.subscribe(booking.id);

    let confirmed = hard_confirm(booking, &scribe, &[], now()).unwrap();
    hub.publish(&confirmed.intents);

    assert!(matches!(
        recv_intent(&mut rx).await,
        Intent::NotifyTutor { .. }
    ));
    assert!(matches!(
        recv_intent(&mut rx).await,
        Intent::NotifyParent { .. }
    ));
}

#[tokio::test]
async fn decline_then_reassign_reaches_second_tutor() {
    let roster = Roster::new();
    let first = tutor(Role::Both, &[]);
    let second = tutor(Role::Both, &[]);
    roster.add_tutor(first.clone()).unwrap();
    roster.add_tutor(second.clone()).unwrap();

    let booking = create_booking(request(Role::Reader, "English"), now()).unwrap();
    let assigned = assign(booking, &first, &roster.all_windows(), now()).unwrap();
    let declined = tutor_decline(assigned.booking).unwrap();
    assert_eq!(declined.booking.status, BookingStatus::TutorDeclined);

    let sink = RecordingSink {
        delivered: Mutex::new(Vec::new()),
    };
    deliver_all(&sink, &declined.intents).await;

    let reassigned = reassign(
        declined.booking,
        &second,
        &roster.all_windows(),
        dt(2026, 5, 20, 14, 0),
    )
    .unwrap();
    deliver_all(&sink, &reassigned.intents).await;

    let delivered = sink.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert!(matches!(
        delivered[0],
        Intent::NotifyAdmin {
            alert: AdminAlert::TutorDeclined,
            ..
        }
    ));
    assert!(matches!(
        delivered[1],
        Intent::NotifyTutor { tutor_id, .. } if tutor_id == second.id
    ));
}

#[tokio::test]
async fn late_cancellation_carries_penalty_verdict() {
    let booking = create_booking(request(Role::Reader, "English"), now()).unwrap();
    let reader = tutor(Role::Reader, &[]);
    let confirmed = hard_confirm(booking, &reader, &[], now()).unwrap();

    let hub = IntentHub::new();
    let mut rx = hub.subscribe(confirmed.booking.id);

    // Exam is 2026-06-02 09:00; 20:00 the evening before is past the parent
    // cutoff but outside the admin 12-hour rule.
    let cancel_time = dt(2026, 6, 1, 20, 0);
    let cancelled = cancel(confirmed.booking, CancelActor::Parent, cancel_time).unwrap();
    assert!(cancelled.penalty_applies);
    assert_eq!(cancelled.booking.status, BookingStatus::Cancelled);
    assert!(cancelled.booking.cancelled);
    assert_eq!(cancelled.booking.cancelled_at, Some(cancel_time));

    hub.publish(&cancelled.intents);
    assert!(matches!(
        recv_intent(&mut rx).await,
        Intent::NotifyTutor { tutor_id, .. } if tutor_id == reader.id
    ));

    // Same instant, admin policy: no penalty.
    let booking = create_booking(request(Role::Reader, "English"), now()).unwrap();
    let admin_cancelled = cancel(booking, CancelActor::Admin, cancel_time).unwrap();
    assert!(!admin_cancelled.penalty_applies);
}

#[tokio::test]
async fn candidate_search_is_roster_order_stable() {
    let roster = Roster::new();
    let mut expected = Vec::new();
    for _ in 0..8 {
        let t = tutor(Role::Reader, &[]);
        roster.add_tutor(t.clone()).unwrap();
        expected.push(t.id);
    }
    expected.sort();

    let booking = create_booking(request(Role::Reader, "English"), now()).unwrap();
    let candidates = roster.candidates(&booking);
    // Truncated to the candidate cap, in roster (id) order.
    assert_eq!(
        candidates.iter().map(|t| t.id).collect::<Vec<_>>(),
        expected[..candidates.len()]
    );
    assert_eq!(candidates.len(), 5);
}
