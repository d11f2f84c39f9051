//! Lifecycle controller: admission, preemption and deferred effects.

mod common;

use common::{ADMIN, Harness, OWNER, STRANGER, ids, settle};
use ticketd::error::{HandlerError, LifecycleError};
use ticketd::platform::memory::{Call, Op};
use ticketd::state::OperationSnapshot;
use ticketd::tickets::{Outcome, TicketAction};

const CLOSED_NOTICE: &str = "🔒 Ticket **fechado**. O autor não pode mais enviar mensagens.";
const REOPENED_NOTICE: &str = "🔓 Ticket **reaberto**.";
const DELETE_FAILED_NOTICE: &str = "Não consegui excluir. Verifique permissões.";

fn scheduled(result: Result<Outcome, HandlerError>) -> tokio::task::JoinHandle<()> {
    match result {
        Ok(Outcome::Scheduled(handle)) => handle,
        other => panic!("expected a scheduled transition, got {other:?}"),
    }
}

fn lifecycle_error(result: Result<Outcome, HandlerError>) -> LifecycleError {
    match result {
        Err(HandlerError::Lifecycle(e)) => e,
        other => panic!("expected a lifecycle error, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn close_then_reopen() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, sink) = h.press(TicketAction::Close, channel, message, OWNER).await;
    let pending = scheduled(result);
    assert_eq!(h.control_ids(message), ids(&["disabled1", "disabled2"]));
    let placeholder = sink.updated_rows().expect("placeholder shown");
    assert!(format!("{placeholder:?}").contains("Fechando..."));
    assert_eq!(
        h.registry.get(channel),
        OperationSnapshot {
            locked: true,
            pending: Some(TicketAction::Close),
        }
    );

    pending.await.unwrap();
    let info = h.guild.channel(channel).unwrap();
    assert_eq!(info.name, "closed-ticket-ana-1");
    assert_eq!(info.member_can_send(OWNER), Some(false));
    assert_eq!(h.control_ids(message), ids(&["ticket_reopen", "ticket_delete"]));
    assert!(h.guild.contents_in(channel).contains(&CLOSED_NOTICE.to_string()));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());

    let (result, _) = h.press(TicketAction::Reopen, channel, message, OWNER).await;
    assert!(matches!(result, Ok(Outcome::Reopened)));
    let info = h.guild.channel(channel).unwrap();
    assert_eq!(info.name, "ticket-ana-1");
    assert_eq!(info.member_can_send(OWNER), Some(true));
    assert_eq!(h.control_ids(message), ids(&["ticket_close", "ticket_delete"]));
    assert!(h.guild.contents_in(channel).contains(&REOPENED_NOTICE.to_string()));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn duplicate_close_is_busy_and_mutates_nothing() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (first, _) = h.press(TicketAction::Close, channel, message, OWNER).await;
    let pending = scheduled(first);
    h.guild.clear_calls();

    let (second, sink) = h.press(TicketAction::Close, channel, message, ADMIN).await;
    assert!(matches!(lifecycle_error(second), LifecycleError::Busy));
    assert!(h.guild.calls().is_empty());
    assert!(sink.responses().is_empty());

    pending.await.unwrap();
    assert_eq!(h.guild.channel(channel).unwrap().name, "closed-ticket-ana-1");
}

#[tokio::test(start_paused = true)]
async fn reopen_before_close_fires_cancels_it() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, _) = h.press(TicketAction::Close, channel, message, OWNER).await;
    let pending = scheduled(result);

    let (result, sink) = h.press(TicketAction::Reopen, channel, message, OWNER).await;
    assert!(matches!(result, Ok(Outcome::Rerendered)));
    assert_eq!(h.control_ids(message), ids(&["ticket_close", "ticket_delete"]));
    assert!(sink.updated_rows().is_some());

    pending.await.unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    let info = h.guild.channel(channel).unwrap();
    assert_eq!(info.name, "ticket-ana-1");
    assert_eq!(info.member_can_send(OWNER), Some(true));
    assert!(!h.mutated(channel));
    assert!(!h.guild.contents_in(channel).contains(&CLOSED_NOTICE.to_string()));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn close_on_closed_ticket_only_rerenders() {
    let h = Harness::new();
    let (channel, message) = h.ticket();
    h.press_and_settle(TicketAction::Close, channel, message, OWNER)
        .await;
    h.guild.clear_calls();

    let (result, sink) = h.press(TicketAction::Close, channel, message, ADMIN).await;
    assert!(matches!(result, Ok(Outcome::Rerendered)));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
    assert!(h.guild.calls().is_empty());
    let rows = sink.updated_rows().unwrap();
    assert_eq!(rows[0].custom_ids(), vec!["ticket_reopen", "ticket_delete"]);
}

#[tokio::test(start_paused = true)]
async fn reopen_on_open_ticket_only_rerenders() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, sink) = h.press(TicketAction::Reopen, channel, message, OWNER).await;
    assert!(matches!(result, Ok(Outcome::Rerendered)));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
    assert!(h.guild.calls().is_empty());
    let rows = sink.updated_rows().unwrap();
    assert_eq!(rows[0].custom_ids(), vec!["ticket_close", "ticket_delete"]);
}

#[tokio::test(start_paused = true)]
async fn delete_requires_an_administrator() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, sink) = h.press(TicketAction::Delete, channel, message, OWNER).await;
    assert!(matches!(
        lifecycle_error(result),
        LifecycleError::PermissionDenied(TicketAction::Delete)
    ));
    assert!(h.guild.channel(channel).is_some());
    assert!(h.guild.calls().is_empty());
    assert!(sink.responses().is_empty());
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn strangers_cannot_close_or_reopen() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, _) = h.press(TicketAction::Close, channel, message, STRANGER).await;
    assert!(matches!(
        lifecycle_error(result),
        LifecycleError::PermissionDenied(TicketAction::Close)
    ));

    h.press_and_settle(TicketAction::Close, channel, message, ADMIN)
        .await;
    let (result, _) = h.press(TicketAction::Reopen, channel, message, STRANGER).await;
    assert!(matches!(
        lifecycle_error(result),
        LifecycleError::PermissionDenied(TicketAction::Reopen)
    ));
    assert_eq!(h.guild.channel(channel).unwrap().name, "closed-ticket-ana-1");
}

#[tokio::test(start_paused = true)]
async fn delete_during_close_cancels_the_close() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    let (result, _) = h.press(TicketAction::Close, channel, message, OWNER).await;
    let close = scheduled(result);

    let (result, _) = h.press(TicketAction::Delete, channel, message, ADMIN).await;
    let delete = scheduled(result);
    assert_eq!(
        h.registry.get(channel).pending,
        Some(TicketAction::Delete)
    );

    close.await.unwrap();
    assert_eq!(h.guild.channel(channel).unwrap().name, "ticket-ana-1");

    delete.await.unwrap();
    assert!(h.guild.channel(channel).is_none());
    assert!(!h.mutated(channel));
    assert!(h
        .guild
        .calls()
        .contains(&Call::Delete { channel }));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn reopen_during_delete_cancels_the_delete() {
    let h = Harness::new();
    let (channel, message) = h.ticket();
    h.press_and_settle(TicketAction::Close, channel, message, OWNER)
        .await;

    let (result, _) = h.press(TicketAction::Delete, channel, message, ADMIN).await;
    let delete = scheduled(result);
    assert_eq!(
        h.registry.get(channel).pending,
        Some(TicketAction::Delete)
    );

    let (result, _) = h.press(TicketAction::Reopen, channel, message, OWNER).await;
    assert!(matches!(result, Ok(Outcome::Reopened)));

    delete.await.unwrap();
    tokio::time::sleep(std::time::Duration::from_secs(10)).await;

    let info = h.guild.channel(channel).expect("channel kept");
    assert_eq!(info.name, "ticket-ana-1");
    assert_eq!(info.member_can_send(OWNER), Some(true));
    assert_eq!(h.control_ids(message), ids(&["ticket_close", "ticket_delete"]));
    assert!(!h.guild.calls().contains(&Call::Delete { channel }));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn failed_delete_reverts_and_allows_retry() {
    let h = Harness::new();
    let (channel, message) = h.ticket();
    h.press_and_settle(TicketAction::Close, channel, message, OWNER)
        .await;

    h.guild.fail(Op::Delete);
    let (result, _) = h.press(TicketAction::Delete, channel, message, ADMIN).await;
    scheduled(result).await.unwrap();

    assert!(h.guild.channel(channel).is_some());
    assert_eq!(h.control_ids(message), ids(&["ticket_reopen", "ticket_delete"]));
    assert!(h.guild.contents_in(channel).contains(&DELETE_FAILED_NOTICE.to_string()));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());

    h.guild.recover(Op::Delete);
    h.press_and_settle(TicketAction::Delete, channel, message, ADMIN)
        .await;
    assert!(h.guild.channel(channel).is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_mutations_do_not_block_the_rest() {
    let h = Harness::new();
    let (channel, message) = h.ticket();

    h.guild.fail(Op::Rename);
    h.press_and_settle(TicketAction::Close, channel, message, OWNER)
        .await;

    let info = h.guild.channel(channel).unwrap();
    assert_eq!(info.name, "ticket-ana-1");
    assert_eq!(info.member_can_send(OWNER), Some(false));
    assert_eq!(h.control_ids(message), ids(&["ticket_reopen", "ticket_delete"]));
    assert_eq!(h.registry.get(channel), OperationSnapshot::default());
}

#[tokio::test(start_paused = true)]
async fn channels_without_owner_are_not_tickets() {
    let h = Harness::new();
    let channel = h.guild.add_text_channel("geral");

    let (result, _) = h
        .press(TicketAction::Close, channel, ticketd_proto::MessageId(1), ADMIN)
        .await;
    assert!(matches!(lifecycle_error(result), LifecycleError::NotATicket));
}

#[tokio::test(start_paused = true)]
async fn transitions_on_different_channels_are_independent() {
    let h = Harness::new();
    let (first, first_msg) = h.ticket();
    let (second, second_msg) = h.guild.add_ticket("ticket-bia-2", OWNER);

    let (a, _) = h.press(TicketAction::Close, first, first_msg, OWNER).await;
    let (b, _) = h.press(TicketAction::Close, second, second_msg, OWNER).await;
    settle(a.unwrap()).await;
    settle(b.unwrap()).await;

    assert_eq!(h.guild.channel(first).unwrap().name, "closed-ticket-ana-1");
    assert_eq!(h.guild.channel(second).unwrap().name, "closed-ticket-bia-2");
}
