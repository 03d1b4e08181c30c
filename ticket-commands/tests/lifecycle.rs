use std::{sync::Arc, time::Duration};

use twilight_model::{channel::ChannelType, guild::Permissions, id::Id};

use ticket_commands::tickets::close::{CloseDecision, Delivery, authorize_close, finish_close};
use ticket_commands::tickets::open::{OpenOutcome, open_ticket};
use ticket_core::model::{Actor, MemberInfo};
use ticket_core::platform::memory::{MemoryPlatform, fixed_time};
use ticket_core::{Platform, Services, TicketSettings};
use ticket_store::{ConfigStore, GuildConfig};
use ticket_utils::permissions::CloseGrant;

const GUILD: u64 = 10;

struct Harness {
    platform: Arc<MemoryPlatform>,
    services: Services,
    _dir: tempfile::TempDir,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = ConfigStore::new(dir.path().join("config.json"));
    let platform = Arc::new(MemoryPlatform::new(Id::new(GUILD)));
    let services = Services::new(
        Arc::clone(&platform) as Arc<dyn Platform>,
        store,
        TicketSettings::default(),
    );

    Harness {
        platform,
        services,
        _dir: dir,
    }
}

fn as_actor(member: &MemberInfo, permissions: Permissions) -> Actor {
    Actor {
        member: member.clone(),
        permissions,
    }
}

async fn guild_config(services: &Services) -> GuildConfig {
    services.store.guild(GUILD).await.expect("guild config")
}

#[tokio::test(start_paused = true)]
async fn open_chat_close_archives_transcript_and_deletes_channel() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);

    let alice = platform.add_member(42, "alice", 0).await;
    let staff = platform.add_member(43, "sam", 0).await;
    let staff_role = platform.add_role(77, "Helpers").await;
    let category = platform.add_channel("Support", ChannelType::GuildCategory).await;
    let archive = platform.add_channel("transcripts", ChannelType::GuildText).await;

    services
        .store
        .update(GUILD, |guild_config| {
            guild_config.set_ticket_category(category.id.get());
            guild_config.add_staff_role(staff_role.get());
            guild_config.set_transcript_channel(archive.id.get());
        })
        .await
        .expect("configure guild");

    let OpenOutcome::Created(ticket) = open_ticket(&services, guild_id, &alice).await else {
        panic!("expected a new ticket");
    };

    assert_eq!(ticket.name, "ticket-alice-0");
    assert_eq!(ticket.parent_id, Some(category.id));
    {
        let state = platform.state().await;
        let request = &state.created[0];
        assert_eq!(request.overwrites.len(), 4);
        // staff notice and welcome message
        assert_eq!(
            state.sent.iter().filter(|(channel_id, _)| *channel_id == ticket.id).count(),
            2
        );
    }

    platform.post(ticket.id, &alice, "my order never arrived").await;
    platform.post(ticket.id, &staff, "looking into it").await;
    platform.post(ticket.id, &alice, "thanks!").await;

    let closer = as_actor(&staff, Permissions::empty());
    let mut closer_with_role = closer.clone();
    closer_with_role.member.roles = vec![staff_role];
    let config = guild_config(&services).await;

    assert_eq!(
        authorize_close(&ticket, &closer_with_role, &config),
        CloseDecision::Allowed(CloseGrant::Staff)
    );

    let started = tokio::time::Instant::now();
    let report = finish_close(
        &services,
        guild_id,
        &ticket,
        &closer_with_role.member,
        &config,
        fixed_time(3_600),
    )
    .await;

    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(report.deleted);
    assert!(report.archived);
    assert_eq!(report.direct_message, Delivery::Sent);
    assert_eq!(report.opener, Some(alice.user_id));

    let transcript = report.transcript.expect("transcript");
    assert_eq!(transcript.entries.len(), 3);
    assert_eq!(transcript.header[0], "Ticket transcript: ticket-alice-0");
    assert_eq!(transcript.header[1], "User: alice (alice#0)");
    assert!(transcript.entries[0].ends_with("alice (alice#0): my order never arrived"));
    assert!(transcript.entries[1].ends_with("sam (sam#0): looking into it"));
    assert!(transcript.entries[2].ends_with("alice (alice#0): thanks!"));

    assert!(!platform.channel_exists(ticket.id).await);

    let state = platform.state().await;
    let (_, archived) = state
        .sent
        .iter()
        .find(|(channel_id, _)| *channel_id == archive.id)
        .expect("archived transcript");
    let attachment = archived.attachment.as_ref().expect("transcript file");
    assert_eq!(attachment.filename, "transcript-ticket-alice-0.txt");

    let (recipient, direct) = &state.direct[0];
    assert_eq!(*recipient, alice.user_id);
    assert_eq!(direct.attachment, archived.attachment);
}

#[tokio::test]
async fn second_open_points_at_existing_ticket() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;

    let OpenOutcome::Created(first) = open_ticket(&services, guild_id, &alice).await else {
        panic!("expected a new ticket");
    };

    assert_eq!(
        open_ticket(&services, guild_id, &alice).await,
        OpenOutcome::AlreadyOpen(first)
    );
    assert_eq!(platform.state().await.created.len(), 1);
}

#[tokio::test]
async fn open_without_configuration_creates_bare_ticket() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let alice = platform.add_member(42, "Alice Smith", 7).await;

    let OpenOutcome::Created(ticket) = open_ticket(&services, Id::new(GUILD), &alice).await else {
        panic!("expected a new ticket");
    };

    assert_eq!(ticket.name, "ticket-alice-smith-0007");
    assert_eq!(ticket.parent_id, None);

    let state = platform.state().await;
    // @everyone, opener, bot
    assert_eq!(state.created[0].overwrites.len(), 3);
    // welcome only, no staff ping
    assert_eq!(state.sent.len(), 1);
    assert!(!state.sent[0].1.components.is_empty());
}

#[tokio::test]
async fn stale_category_and_deleted_staff_role_are_ignored_on_open() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let alice = platform.add_member(42, "alice", 0).await;
    // a text channel where the category used to be
    let general = platform.add_channel("general", ChannelType::GuildText).await;

    services
        .store
        .update(GUILD, |guild_config| {
            guild_config.set_ticket_category(general.id.get());
            guild_config.add_staff_role(999);
        })
        .await
        .expect("configure guild");

    let OpenOutcome::Created(ticket) = open_ticket(&services, Id::new(GUILD), &alice).await else {
        panic!("expected a new ticket");
    };

    assert_eq!(ticket.parent_id, None);

    let state = platform.state().await;
    let overwrites = &state.created[0].overwrites;
    assert_eq!(overwrites.len(), 3);
    assert_eq!(overwrites[0].deny, Permissions::VIEW_CHANNEL);
    assert_eq!(state.sent.len(), 1);
}

#[tokio::test]
async fn in_flight_creation_is_reported_as_pending() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;

    let reservation = services
        .reservations
        .try_reserve(guild_id, alice.user_id)
        .expect("first reservation");

    assert_eq!(open_ticket(&services, guild_id, &alice).await, OpenOutcome::Pending);
    assert!(platform.state().await.created.is_empty());

    drop(reservation);
    assert!(matches!(
        open_ticket(&services, guild_id, &alice).await,
        OpenOutcome::Created(_)
    ));
    assert!(!services.reservations.is_reserved(guild_id, alice.user_id));
}

#[tokio::test]
async fn denied_channel_creation_is_forbidden() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let alice = platform.add_member(42, "alice", 0).await;
    platform.state().await.deny_channel_creation = true;

    assert_eq!(
        open_ticket(&services, Id::new(GUILD), &alice).await,
        OpenOutcome::Forbidden
    );
    assert!(platform.state().await.channels.is_empty());
}

#[tokio::test]
async fn close_authorization_covers_opener_staff_and_managers() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;
    let staff_role = platform.add_role(77, "Helpers").await;
    services
        .store
        .update(GUILD, |guild_config| guild_config.add_staff_role(staff_role.get()))
        .await
        .expect("configure guild");

    let OpenOutcome::Created(ticket) = open_ticket(&services, guild_id, &alice).await else {
        panic!("expected a new ticket");
    };
    let config = guild_config(&services).await;

    let mut staff = platform.add_member(43, "sam", 0).await;
    staff.roles = vec![staff_role];
    let manager = platform.add_member(44, "mo", 0).await;
    let stranger = platform.add_member(45, "eve", 0).await;

    assert_eq!(
        authorize_close(&ticket, &as_actor(&alice, Permissions::empty()), &config),
        CloseDecision::Allowed(CloseGrant::Opener)
    );
    assert_eq!(
        authorize_close(&ticket, &as_actor(&staff, Permissions::empty()), &config),
        CloseDecision::Allowed(CloseGrant::Staff)
    );
    assert_eq!(
        authorize_close(&ticket, &as_actor(&manager, Permissions::MANAGE_CHANNELS), &config),
        CloseDecision::Allowed(CloseGrant::ChannelManager)
    );
    assert_eq!(
        authorize_close(&ticket, &as_actor(&stranger, Permissions::SEND_MESSAGES), &config),
        CloseDecision::Denied
    );
    assert!(platform.channel_exists(ticket.id).await);
}

#[tokio::test(start_paused = true)]
async fn blocked_direct_messages_leave_a_notice_in_the_archive() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;
    let archive = platform.add_channel("transcripts", ChannelType::GuildText).await;
    services
        .store
        .update(GUILD, |guild_config| {
            guild_config.set_transcript_channel(archive.id.get())
        })
        .await
        .expect("configure guild");
    platform.state().await.dm_blocked.insert(alice.user_id);

    let OpenOutcome::Created(ticket) = open_ticket(&services, guild_id, &alice).await else {
        panic!("expected a new ticket");
    };
    let config = guild_config(&services).await;

    let report = finish_close(&services, guild_id, &ticket, &alice, &config, fixed_time(60)).await;

    assert_eq!(report.direct_message, Delivery::Blocked);
    assert!(report.archived);
    assert!(report.deleted);

    let state = platform.state().await;
    let archived: Vec<_> = state
        .sent
        .iter()
        .filter(|(channel_id, _)| *channel_id == archive.id)
        .collect();
    assert_eq!(archived.len(), 2);
    assert!(archived[1].1.attachment.is_none());
    assert!(state.direct.is_empty());
}

#[tokio::test(start_paused = true)]
async fn history_failure_still_deletes_the_channel() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;

    let OpenOutcome::Created(ticket) = open_ticket(&services, guild_id, &alice).await else {
        panic!("expected a new ticket");
    };
    platform.state().await.fail_history = true;

    let report = finish_close(
        &services,
        guild_id,
        &ticket,
        &alice,
        &GuildConfig::default(),
        fixed_time(60),
    )
    .await;

    assert!(report.transcript.is_none());
    assert_eq!(report.direct_message, Delivery::Skipped);
    assert!(report.deleted);
    assert!(!platform.channel_exists(ticket.id).await);
}

#[tokio::test(start_paused = true)]
async fn opener_is_found_by_channel_name_when_topic_is_missing() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let alice = platform.add_member(42, "alice", 0).await;
    let ticket = platform.add_channel("ticket-alice-0", ChannelType::GuildText).await;
    let admin = platform.add_member(50, "ada", 0).await;

    let report = finish_close(
        &services,
        guild_id,
        &ticket,
        &admin,
        &GuildConfig::default(),
        fixed_time(60),
    )
    .await;

    assert_eq!(report.opener, Some(alice.user_id));
    assert_eq!(report.direct_message, Delivery::Sent);
    assert!(!report.archived);
}

#[tokio::test(start_paused = true)]
async fn unknown_opener_still_produces_a_transcript() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let admin = platform.add_member(50, "ada", 0).await;
    let ticket = platform.add_channel("ticket-ghost-0", ChannelType::GuildText).await;
    platform.post(ticket.id, &admin, "anyone here?").await;

    let report = finish_close(
        &services,
        guild_id,
        &ticket,
        &admin,
        &GuildConfig::default(),
        fixed_time(60),
    )
    .await;

    let transcript = report.transcript.expect("transcript");
    assert_eq!(report.opener, None);
    assert_eq!(transcript.header[1], "User: unknown");
    assert_eq!(transcript.entries.len(), 1);
    assert_eq!(report.direct_message, Delivery::Skipped);
    assert!(report.deleted);
}

#[tokio::test]
async fn closing_an_already_deleted_channel_counts_as_deleted() {
    let Harness {
        platform,
        services,
        _dir,
    } = harness();
    let guild_id = Id::new(GUILD);
    let services = Services::new(
        Arc::clone(&platform) as Arc<dyn Platform>,
        services.store.clone(),
        TicketSettings {
            close_delay: Duration::ZERO,
        },
    );
    let admin = platform.add_member(50, "ada", 0).await;
    let ticket = platform.add_channel("ticket-ghost-0", ChannelType::GuildText).await;
    platform.state().await.channels.clear();

    let report = finish_close(
        &services,
        guild_id,
        &ticket,
        &admin,
        &GuildConfig::default(),
        fixed_time(60),
    )
    .await;

    assert!(report.deleted);
    assert!(report.transcript.is_none());
}
