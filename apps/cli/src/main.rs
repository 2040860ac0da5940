use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use client_core::{HttpGateway, Identity, PlatformClient};
use shared::domain::Role;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long)]
    server_url: String,
    /// Sign in as this user id before dispatching anything.
    #[arg(long)]
    user: Option<String>,
    /// Treat the signed-in user as an admin.
    #[arg(long)]
    admin: bool,
    /// Bearer token forwarded to the backend.
    #[arg(long)]
    bearer_token: Option<String>,
    /// Run a free-text search instead of the plain listing.
    #[arg(long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let mut gateway = HttpGateway::new(&args.server_url)?;
    if let Some(token) = &args.bearer_token {
        gateway = gateway.with_bearer_token(token);
    }
    let client = PlatformClient::new(Arc::new(gateway));

    if let Some(user) = &args.user {
        let role = if args.admin { Role::Admin } else { Role::Member };
        client.session.sign_in(Identity::new(user.as_str(), role)).await;
    }

    client.algorithms.fetch_categories().await?;
    println!(
        "categories: {}",
        client.algorithms.categories().await.join(", ")
    );

    match &args.query {
        Some(query) => client.search.set_search_text(query).await?,
        None => client.search.refresh().await?,
    }

    let page = client.algorithms.page_info().await;
    println!(
        "{} algorithms, page {}/{}:",
        page.total, page.current_page, page.pages
    );
    for algorithm in client.algorithms.list().await {
        println!(
            "  [{}] {} ({:?})",
            algorithm.slug, algorithm.title, algorithm.difficulty
        );
    }

    Ok(())
}
