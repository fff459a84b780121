//! Cybsi API CLI binary.
//!
//! A command-line interface for reading replists and following their changes.

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use cybsi::cli::{Cli, Collection, Command, Resource};
use cybsi::output::PrettyPrint;
use cybsi::{
    replist_entities, ChangeStream, Cursor, CybsiClient, EntitySetChange, EntityView, Get, List,
    PaginationParams, ReplistCommonView, ReplistSnapshot, ReplistView, StoredQueryCommonView, StoredQueryView,
    UserCommonView, UserListQuery, UserView,
};
use serde::Serialize;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let client = match CybsiClient::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("Hint: Set CYBSI_API_URL and CYBSI_API_KEY environment variables");
            return ExitCode::FAILURE;
        }
    };

    match run(&client, cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if e.is_cursor_out_of_range() {
                eprintln!("Hint: The cursor expired; run 'cybsi entities <replist>' for a fresh one");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(client: &CybsiClient, cli: Cli) -> cybsi::Result<()> {
    match cli.command {
        Command::Get { resource, uuid } => handle_get(client, resource, uuid, cli.json).await,
        Command::List {
            collection,
            limit,
            cursor,
            all,
        } => {
            let params = PaginationParams {
                cursor: cursor.map(Cursor::new),
                limit,
            };
            handle_list(client, collection, &params, all, cli.json).await
        }
        Command::Entities { replist, limit } => {
            handle_entities(client, replist, limit, cli.json).await
        }
        Command::Changes {
            replist,
            cursor,
            limit,
            follow,
            interval,
        } => {
            let mut stream = ChangeStream::new(client.clone(), replist, Cursor::new(cursor));
            if let Some(limit) = limit {
                stream = stream.with_limit(limit);
            }
            if follow {
                follow_changes(stream, Duration::from_secs(interval), cli.json).await
            } else {
                poll_changes(stream, cli.json).await
            }
        }
    }
}

async fn handle_get(
    client: &CybsiClient,
    resource: Resource,
    uuid: Uuid,
    json: bool,
) -> cybsi::Result<()> {
    match resource {
        Resource::Replist => output_single(&ReplistView::get(client, uuid).await?, json),
        Resource::Entity => output_single(&EntityView::get(client, uuid).await?, json),
        Resource::User => output_single(&UserView::get(client, uuid).await?, json),
        Resource::StoredQuery => output_single(&StoredQueryView::get(client, uuid).await?, json),
    }
}

async fn handle_list(
    client: &CybsiClient,
    collection: Collection,
    params: &PaginationParams,
    all: bool,
    json: bool,
) -> cybsi::Result<()> {
    match collection {
        Collection::Replists => {
            list::<ReplistCommonView, ReplistRow>(client, &(), params, all, json).await
        }
        Collection::Users => {
            list::<UserCommonView, UserRow>(client, &UserListQuery::default(), params, all, json)
                .await
        }
        Collection::StoredQueries => {
            list::<StoredQueryCommonView, StoredQueryRow>(client, &(), params, all, json).await
        }
    }
}

async fn list<T, R>(
    client: &CybsiClient,
    query: &T::Query,
    params: &PaginationParams,
    all: bool,
    json: bool,
) -> cybsi::Result<()>
where
    T: List + Serialize,
    R: Tabled + for<'a> From<&'a T>,
{
    let page = T::list_page(client, query, params).await?;

    if all {
        let items = page.collect_all().await?;
        return output_items::<T, R>(&items, json);
    }

    output_items::<T, R>(page.items(), json)?;
    if !json {
        match page.cursor().non_empty() {
            Some(cursor) if page.has_next() => println!("\nNext page: --cursor '{cursor}'"),
            _ => println!("\n(end)"),
        }
    }
    Ok(())
}

async fn handle_entities(
    client: &CybsiClient,
    replist: Uuid,
    limit: Option<u32>,
    json: bool,
) -> cybsi::Result<()> {
    let params = PaginationParams {
        cursor: None,
        limit,
    };
    let ReplistSnapshot {
        entities,
        change_cursor,
    } = replist_entities(client, replist, &params)
        .await?
        .collect_all()
        .await?;

    if json {
        let output = serde_json::json!({
            "entities": entities,
            "changeCursor": change_cursor,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let rows: Vec<EntityRow> = entities.iter().map(EntityRow::from).collect();
        println!("{}", Table::new(rows));
        println!("\n{} entities, change cursor: {change_cursor}", entities.len());
    }
    Ok(())
}

async fn poll_changes(mut stream: ChangeStream, json: bool) -> cybsi::Result<()> {
    let changes = stream.poll().await?;
    output_changes(&changes, stream.cursor(), stream.is_caught_up(), json)
}

async fn follow_changes(mut stream: ChangeStream, interval: Duration, json: bool) -> cybsi::Result<()> {
    loop {
        let polled = tokio::select! {
            _ = tokio::signal::ctrl_c() => None,
            changes = stream.next_changes(interval) => Some(changes),
        };

        match polled {
            Some(changes) => {
                output_changes(&changes?, stream.cursor(), stream.is_caught_up(), json)?;
            }
            None => {
                eprintln!("Resume from cursor: {}", stream.cursor());
                return Ok(());
            }
        }
    }
}

fn output_changes(
    changes: &[EntitySetChange<EntityView>],
    cursor: &Cursor,
    caught_up: bool,
    json: bool,
) -> cybsi::Result<()> {
    if json {
        let output = serde_json::json!({
            "changes": changes,
            "cursor": cursor,
            "caughtUp": caught_up,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        if !changes.is_empty() {
            let rows: Vec<ChangeRow> = changes.iter().map(ChangeRow::from).collect();
            println!("{}", Table::new(rows));
        }
        let status = if caught_up { "caught up" } else { "more available" };
        println!("Cursor: {cursor} ({status})");
    }
    Ok(())
}

fn output_single<T: Serialize + PrettyPrint>(item: &T, json: bool) -> cybsi::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        println!("{}", item.pretty_print());
    }
    Ok(())
}

fn output_items<T, R>(items: &[T], json: bool) -> cybsi::Result<()>
where
    T: Serialize,
    R: Tabled + for<'a> From<&'a T>,
{
    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        let rows: Vec<R> = items.iter().map(R::from).collect();
        println!("{}", Table::new(rows));
    }
    Ok(())
}

// Table row types for non-JSON output

fn keys_column(entity: &EntityView) -> String {
    entity
        .keys
        .iter()
        .map(|k| k.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Tabled)]
struct ReplistRow {
    uuid: Uuid,
    query: String,
    share_level: String,
    enabled: bool,
}

impl From<&ReplistCommonView> for ReplistRow {
    fn from(r: &ReplistCommonView) -> Self {
        Self {
            uuid: r.uuid,
            query: r.query.name.clone(),
            share_level: r.share_level.to_string(),
            enabled: r.is_enabled,
        }
    }
}

#[derive(Tabled)]
struct UserRow {
    uuid: Uuid,
    login: String,
    name: String,
    disabled: bool,
}

impl From<&UserCommonView> for UserRow {
    fn from(u: &UserCommonView) -> Self {
        Self {
            uuid: u.uuid,
            login: u.login.clone(),
            name: u.full_name.clone().unwrap_or_default(),
            disabled: u.is_disabled,
        }
    }
}

#[derive(Tabled)]
struct StoredQueryRow {
    uuid: Uuid,
    name: String,
}

impl From<&StoredQueryCommonView> for StoredQueryRow {
    fn from(q: &StoredQueryCommonView) -> Self {
        Self {
            uuid: q.uuid,
            name: q.name.clone(),
        }
    }
}

#[derive(Tabled)]
struct EntityRow {
    uuid: Uuid,
    #[tabled(rename = "type")]
    entity_type: String,
    keys: String,
}

impl From<&EntityView> for EntityRow {
    fn from(e: &EntityView) -> Self {
        Self {
            uuid: e.uuid,
            entity_type: e.entity_type.to_string(),
            keys: keys_column(e),
        }
    }
}

#[derive(Tabled)]
struct ChangeRow {
    operation: String,
    uuid: Uuid,
    #[tabled(rename = "type")]
    entity_type: String,
    keys: String,
}

impl From<&EntitySetChange<EntityView>> for ChangeRow {
    fn from(c: &EntitySetChange<EntityView>) -> Self {
        Self {
            operation: c.operation.to_string(),
            uuid: c.entity.uuid,
            entity_type: c.entity.entity_type.to_string(),
            keys: keys_column(&c.entity),
        }
    }
}
