//! HTTP server for the texpand control API.

use crate::api::{
    buffer_preview, engine_status, list_snippets, search_snippets, store_stats, toggle_engine,
    ControlState, SearchQuery,
};
use crate::server::utils::save_api_port;
use log::{info, warn};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use texpand_core::{Result, TexpandError};
use warp::{Filter, Rejection, Reply};

fn with_state(
    state: ControlState,
) -> impl Filter<Extract = (ControlState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

/// All control routes, without binding anything.
pub fn routes(
    state: ControlState,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST"]);

    let status_route = warp::path!("api" / "engine" / "status")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&engine_status(&state)));

    let toggle_route = warp::path!("api" / "engine" / "toggle")
        .and(warp::post())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&toggle_engine(&state)));

    let buffer_route = warp::path!("api" / "engine" / "buffer")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&buffer_preview(&state)));

    let snippets_route = warp::path!("api" / "snippets")
        .and(warp::get())
        .and(with_state(state.clone()))
        .map(|state: ControlState| warp::reply::json(&list_snippets(&state)));

    let search_route = warp::path!("api" / "snippets" / "search")
        .and(warp::get())
        .and(warp::query::<SearchQuery>())
        .and(with_state(state.clone()))
        .map(|query: SearchQuery, state: ControlState| {
            warp::reply::json(&search_snippets(&state, &query.q))
        });

    let stats_route = warp::path!("api" / "stats")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: ControlState| warp::reply::json(&store_stats(&state)));

    // Health check endpoint
    let health_route = warp::path!("health").map(|| "texpand control server is running");

    status_route
        .or(toggle_route)
        .or(buffer_route)
        .or(snippets_route)
        .or(search_route)
        .or(stats_route)
        .or(health_route)
        .with(cors)
}

/// Bind the control routes on `addr`. Returns the bound address and the
/// server future, which completes once `shutdown` resolves.
pub fn bind_control_server(
    state: ControlState,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = ()> + Send)> {
    warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| TexpandError::Api(format!("Failed to bind to {}: {}", addr, e)))
}

/// Serve the control API on 127.0.0.1:`port` until ctrl-c.
pub async fn start_control_server(state: ControlState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));

    let (bound, server) = bind_control_server(state, addr, async {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal, stopping control server...");
    })?;

    // Save the port to file so the CLI can find it later
    if let Err(e) = save_api_port(bound.port()) {
        warn!("Failed to save control port: {}", e);
    }

    info!("Control server listening on http://{}", bound);
    server.await;
    Ok(())
}
