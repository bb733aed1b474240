use std::collections::HashMap;

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    Layer as _, fmt::Layer, layer::SubscriberExt, util::SubscriberInitExt as _,
};
use waypoint_server::{AppState, HandlerMap, ProjectConfig, Req, Res, SwappableRouter, start_server};

#[tokio::main]
async fn main() -> Result<()> {
    let layer = Layer::new().with_filter(LevelFilter::INFO);
    tracing_subscriber::registry().with(layer).init();

    let config = include_str!("../fixtures/config.yml");
    let config = ProjectConfig::from_yaml(config)?;
    println!("routes: {:?}", config.routes);

    let router = SwappableRouter::try_new(&config.routes)?;

    let mut handlers = HandlerMap::new();
    handlers.insert_with_params("hello", &["id"], |req: Req| {
        Res::builder()
            .status(200)
            .body(format!(
                "hello #{}",
                req.params.get("id").map(String::as_str).unwrap_or("?")
            ))
            .build()
    });
    handlers.insert("hello_post", |_req: Req| Res::builder().status(201).build());
    handlers.insert("echo", |req: Req| {
        let body = serde_json::json!({ "params": req.params, "query": req.query });
        Res::builder()
            .status(200)
            .headers(HashMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]))
            .body(body.to_string())
            .build()
    });
    handlers.insert("remove", |_req: Req| Res::builder().status(204).build());

    start_server(8888, AppState::new(router, handlers)).await?;
    Ok(())
}
