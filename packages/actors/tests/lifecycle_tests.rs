#![allow(clippy::disallowed_methods)]

mod common;

use std::error::Error;
use std::sync::Arc;

use chrono::Local;
use serde_json::json;
use tokio::task::JoinSet;

use actors::{ActorError, DepartmentMessage, Outcome, QueueService, concurrency, global_registry};
use common::{FailingBroadcaster, RecordingBroadcaster, instant, seed_token, status_of};
use db::repositories::{CurrentTokenRepository, TokenRepository};
use queue_core::{
    DepartmentId, DisplayUpdate, QueueEvent, RegistrationRequest, TokenLabel, TokenStatus,
    VISIT_TIME_FORMAT,
};

type TestResult = Result<(), Box<dyn Error>>;

fn service() -> (QueueService<RecordingBroadcaster>, Arc<RecordingBroadcaster>) {
    let broadcaster = Arc::new(RecordingBroadcaster::default());
    (QueueService::new(Arc::clone(&broadcaster)), broadcaster)
}

fn registration(patient_id: &str, name: &str, department_id: i64) -> RegistrationRequest {
    RegistrationRequest {
        patient_id: Some(patient_id.to_string()),
        name: Some(name.to_string()),
        department_id: Some(json!(department_id)),
        department_name: None,
        date_time: Some(common::at(9, 30).format(VISIT_TIME_FORMAT).to_string()),
    }
}

#[test]
fn test_empty_queue_leaves_current_token() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(1);

        // Nothing was ever shown.
        let outcome = service.move_next(department).await?;
        assert!(outcome.served.is_none());
        assert!(CurrentTokenRepository::get(department).await?.is_none());

        let done = seed_token(department, 1, "Ravi Menon", TokenStatus::Completed, instant(8, 0)).await?;
        CurrentTokenRepository::point_to(&done, None, instant(8, 0)).await?;

        let outcome = service.call_next(department).await?;
        assert!(outcome.served.is_none());

        let current = CurrentTokenRepository::get(department).await?;
        assert_eq!(current.map(|c| c.token), Some(done.token));
        assert_eq!(status_of(&done).await?, TokenStatus::Completed);

        let cleared = QueueEvent::UpdateToken(DisplayUpdate::cleared(department));
        assert_eq!(broadcaster.events(), vec![cleared.clone(), cleared]);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_recall_outranks_waiting() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(1);

        let a = seed_token(department, 1, "Anita Das", TokenStatus::Recall, instant(10, 0)).await?;
        let b = seed_token(department, 2, "Bala Krishnan", TokenStatus::Waiting, instant(10, 5)).await?;

        let outcome = service.call_next(department).await?;
        let served = outcome.served.ok_or("expected a token")?;
        assert_eq!(served.token.token, a.token);
        assert_eq!(served.token.status, TokenStatus::Recall);
        assert_eq!(served.name, "Anita Das");
        assert_eq!(served.department, "General Medicine");

        // Recall is served as is, never promoted.
        assert_eq!(status_of(&a).await?, TokenStatus::Recall);
        assert_eq!(status_of(&b).await?, TokenStatus::Waiting);

        let current = CurrentTokenRepository::get(department).await?.ok_or("no current token")?;
        assert_eq!((current.token, current.seq), (a.token, 1));

        assert_eq!(
            broadcaster.events(),
            vec![QueueEvent::UpdateToken(DisplayUpdate::showing(
                1,
                "Anita Das",
                department,
                TokenStatus::Recall
            ))]
        );

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_call_next_completes_current_and_promotes_waiting() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, _) = service();
        let department = DepartmentId(2);

        let held = seed_token(department, 1, "Chitra Nair", TokenStatus::Hold, instant(9, 0)).await?;
        let first = seed_token(department, 2, "Dev Patel", TokenStatus::Waiting, instant(9, 10)).await?;
        let second = seed_token(department, 3, "Esha Gupta", TokenStatus::Waiting, instant(9, 20)).await?;
        CurrentTokenRepository::point_to(&held, None, instant(9, 30)).await?;

        let outcome = service.call_next(department).await?;
        let served = outcome.served.ok_or("expected a token")?;

        // The held token is completed, not left on hold.
        assert_eq!(status_of(&held).await?, TokenStatus::Completed);
        assert_eq!(served.token.token, first.token);
        assert_eq!(served.token.status, TokenStatus::Consulting);
        assert_eq!(status_of(&first).await?, TokenStatus::Consulting);
        assert_eq!(status_of(&second).await?, TokenStatus::Waiting);

        let current = CurrentTokenRepository::get(department).await?.ok_or("no current token")?;
        assert_eq!(current.token, served.token.token);

        let outcome = service.call_next(department).await?;
        assert_eq!(outcome.served.map(|s| s.token.seq), Some(3));
        assert_eq!(status_of(&first).await?, TokenStatus::Completed);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_move_next_on_hold_is_no_show() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(1);

        let held = seed_token(department, 1, "Farah Khan", TokenStatus::Hold, instant(9, 0)).await?;
        let waiting = seed_token(department, 2, "Gopal Rao", TokenStatus::Waiting, instant(9, 5)).await?;
        CurrentTokenRepository::point_to(&held, None, instant(9, 10)).await?;

        let outcome = service.move_next(department).await?;
        assert_eq!(status_of(&held).await?, TokenStatus::NoShow);
        let served = outcome.served.ok_or("expected a token")?;
        assert_eq!(served.token.token, waiting.token);
        assert_eq!(served.token.status, TokenStatus::Consulting);

        assert_eq!(
            broadcaster.events(),
            vec![
                QueueEvent::UpdateToken(DisplayUpdate::showing(
                    1,
                    "Farah Khan",
                    department,
                    TokenStatus::NoShow
                )),
                QueueEvent::UpdateToken(DisplayUpdate::showing(
                    2,
                    "Gopal Rao",
                    department,
                    TokenStatus::Consulting
                )),
            ]
        );

        // A no-show is never served again.
        let outcome = service.call_next(department).await?;
        assert!(outcome.served.is_none());
        assert_eq!(status_of(&held).await?, TokenStatus::NoShow);
        assert_eq!(status_of(&waiting).await?, TokenStatus::Completed);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_move_next_consulting_to_recall() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(2);

        let registered = service
            .register(registration("UPID-7", "Hari Prasad", department.0).validate()?)
            .await?;
        let outcome = service.call_next(department).await?;
        assert_eq!(outcome.served.map(|s| s.token.token), Some(registered.token.token));
        assert_eq!(status_of(&registered.token).await?, TokenStatus::Consulting);

        let outcome = service.move_next(department).await?;
        assert!(outcome.served.is_none());
        assert_eq!(status_of(&registered.token).await?, TokenStatus::Recall);

        // Still pointing at the recalled token.
        let current = CurrentTokenRepository::get(department).await?.ok_or("no current token")?;
        assert_eq!(current.token, registered.token.token);

        let events = broadcaster.events();
        let tail: Vec<&QueueEvent> = events.iter().rev().take(2).rev().collect();
        assert_eq!(
            tail,
            vec![
                &QueueEvent::UpdateToken(DisplayUpdate::showing(
                    1,
                    "Hari Prasad",
                    department,
                    TokenStatus::Recall
                )),
                &QueueEvent::UpdateToken(DisplayUpdate::cleared(department)),
            ]
        );

        // Recall -> hold on the next move.
        service.move_next(department).await?;
        assert_eq!(status_of(&registered.token).await?, TokenStatus::Hold);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_registration_ids_are_dense_per_department() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();

        let mut seqs = Vec::new();
        for (i, name) in ["Isha Roy", "Jay Shah", "Kiran Bose"].iter().enumerate() {
            let registered = service
                .register(registration(&format!("UPID-{}", i), name, 1).validate()?)
                .await?;
            seqs.push(registered.token.seq);
        }
        assert_eq!(seqs, vec![1, 2, 3]);

        let other = service
            .register(registration("UPID-9", "Leela Menon", 2).validate()?)
            .await?;
        assert_eq!(other.token.seq, 1);
        assert_eq!(other.token.status, TokenStatus::Waiting);
        assert_eq!(other.token.date, Local::now().date_naive());

        let registered: Vec<u32> = broadcaster
            .events()
            .iter()
            .filter_map(|event| match event {
                QueueEvent::TokenRegistered(token) => Some(token.seq),
                _ => None,
            })
            .collect();
        assert_eq!(registered, vec![1, 2, 3, 1]);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_concurrent_registrations_do_not_collide() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, _) = service();

        let mut tasks = JoinSet::new();
        for i in 0..8 {
            let service = service.clone();
            let registration = registration(&format!("UPID-C{}", i), "Mohan Lal", 1).validate()?;
            tasks.spawn(async move { service.register(registration).await.map(|r| r.token.seq) });
        }

        let mut seqs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            seqs.push(joined??);
        }
        seqs.sort();
        assert_eq!(seqs, (1..=8).collect::<Vec<u32>>());

        let today = Local::now().date_naive();
        assert_eq!(TokenRepository::list_for_day(DepartmentId(1), today).await?.len(), 8);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_announce_does_not_mutate() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(1);

        let announcement = service.announce(department).await?;
        assert!(announcement.current.is_none());
        assert!(broadcaster.events().is_empty());

        let token = seed_token(department, 1, "Nisha Iyer", TokenStatus::Waiting, instant(9, 0)).await?;
        service.call_next(department).await?;

        let announcement = service.announce(department).await?;
        let view = announcement.current.ok_or("no current token")?;
        assert_eq!(view.name, "Nisha Iyer");
        assert_eq!(view.status, Some(TokenStatus::Consulting));
        assert_eq!(status_of(&token).await?, TokenStatus::Consulting);

        let last = broadcaster.events().pop().ok_or("no events")?;
        let QueueEvent::UpdateToken(update) = last else {
            return Err("expected an update-token event".into());
        };
        assert_eq!(update.token, TokenLabel::Number(1));
        assert_eq!(update.force, Some(true));

        let current = service.current(department).await?.ok_or("no current token")?;
        assert_eq!(current.current.token, token.token);

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_failing_broadcaster_does_not_fail_call() -> TestResult {
    common::run(async {
        common::setup().await?;
        let service = QueueService::new(Arc::new(FailingBroadcaster));
        let department = DepartmentId(2);

        seed_token(department, 1, "Om Prakash", TokenStatus::Waiting, instant(9, 0)).await?;

        let outcome = service.call_next(department).await?;
        assert_eq!(outcome.served.map(|s| s.token.seq), Some(1));
        assert!(outcome.events.is_empty());

        assert!(global_registry().get_department(department).is_some());

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_call_next_skipped_when_caller_gone() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, broadcaster) = service();
        let department = DepartmentId(1);

        let token = seed_token(department, 1, "Priya Raman", TokenStatus::Waiting, instant(9, 0)).await?;

        // Spawns the department actor.
        service.current(department).await?;
        let actor = global_registry()
            .get_department(department)
            .ok_or("department actor not running")?;

        let (tx, rx) = concurrency::oneshot::<Result<Outcome, ActorError>>();
        drop(rx);
        actor
            .send_message(DepartmentMessage::CallNext { reply: tx.into() })
            .map_err(|e| e.to_string())?;

        // The mailbox is FIFO, so the abandoned call-next has been handled by now.
        assert!(service.current(department).await?.is_none());
        assert_eq!(status_of(&token).await?, TokenStatus::Waiting);
        assert!(CurrentTokenRepository::get(department).await?.is_none());
        assert!(broadcaster.events().is_empty());

        Ok::<(), Box<dyn Error>>(())
    })
}

#[test]
fn test_concurrent_call_next_serialized_per_department() -> TestResult {
    common::run(async {
        common::setup().await?;
        let (service, _) = service();
        let general = DepartmentId(1);
        let cardiology = DepartmentId(2);

        let mut general_tokens = Vec::new();
        for seq in 1..=4 {
            general_tokens.push(
                seed_token(general, seq, "Ramesh Kumar", TokenStatus::Waiting, instant(9, seq)).await?,
            );
        }
        for seq in 1..=2 {
            seed_token(cardiology, seq, "Sunita Rao", TokenStatus::Waiting, instant(9, seq)).await?;
        }

        let mut tasks = JoinSet::new();
        for department in [general, general, cardiology, general, cardiology, general] {
            let service = service.clone();
            tasks.spawn(async move {
                let outcome = service.call_next(department).await?;
                Ok::<_, ActorError>((department, outcome.served.map(|s| s.token.seq)))
            });
        }

        let mut general_served = Vec::new();
        let mut cardiology_served = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (department, seq) = joined??;
            let seq = seq.ok_or("every call should serve a token")?;
            if department == general {
                general_served.push(seq);
            } else {
                cardiology_served.push(seq);
            }
        }
        general_served.sort();
        cardiology_served.sort();

        // No token is served twice and none is skipped.
        assert_eq!(general_served, vec![1, 2, 3, 4]);
        assert_eq!(cardiology_served, vec![1, 2]);

        let mut statuses = Vec::new();
        for token in &general_tokens {
            statuses.push(status_of(token).await?);
        }
        assert_eq!(
            statuses,
            vec![
                TokenStatus::Completed,
                TokenStatus::Completed,
                TokenStatus::Completed,
                TokenStatus::Consulting,
            ]
        );

        let current = CurrentTokenRepository::get(general).await?.ok_or("no current token")?;
        assert_eq!(current.seq, 4);

        Ok::<(), Box<dyn Error>>(())
    })
}
