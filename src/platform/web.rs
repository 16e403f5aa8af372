//! Browser glue: LocalStorage, fetch transport and canvas drawing

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, Request, RequestInit, Response, Storage};

use crate::game::Game;
use crate::highscores::ScoreError;
use crate::score_client::{HttpRequest, HttpResponse};
use crate::sim::{Renderable, SpriteKind, VisualState};
use crate::tuning::EnemyKind;

fn local_storage() -> Option<Storage> {
    web_sys::window()?.local_storage().ok()?
}

/// Read a LocalStorage item
pub fn storage_get(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok()?
}

/// Write a LocalStorage item; failures are logged and otherwise ignored
pub fn storage_set(key: &str, value: &str) {
    let Some(storage) = local_storage() else {
        log::warn!("LocalStorage unavailable, not saving {}", key);
        return;
    };
    if storage.set_item(key, value).is_err() {
        log::warn!("Failed to save {}", key);
    }
}

fn network_error(err: JsValue) -> ScoreError {
    ScoreError::Network(format!("{:?}", err))
}

/// Perform one HTTP exchange with `fetch`. Not retried.
pub async fn send(request: &HttpRequest) -> Result<HttpResponse, ScoreError> {
    let window = web_sys::window().ok_or(ScoreError::Unavailable)?;

    let init = RequestInit::new();
    init.set_method(request.method.as_str());
    if let Some(body) = &request.body {
        init.set_body(&JsValue::from_str(body));
    }
    let js_request = Request::new_with_str_and_init(&request.url, &init).map_err(network_error)?;
    if request.body.is_some() {
        js_request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network_error)?;
    }

    log::info!("{} {}", request.method.as_str(), request.url);
    let value = JsFuture::from(window.fetch_with_request(&js_request))
        .await
        .map_err(network_error)?;
    let response: Response = value.dyn_into().map_err(network_error)?;
    let text = JsFuture::from(response.text().map_err(network_error)?)
        .await
        .map_err(network_error)?;

    Ok(HttpResponse {
        status: response.status(),
        body: text.as_string().unwrap_or_default(),
    })
}

/// Placeholder sprite colours until real art is wired in
fn sprite_color(sprite: SpriteKind, visual: VisualState) -> &'static str {
    match (sprite, visual) {
        (_, VisualState::Damaged) => "#ff4040",
        (SpriteKind::Player, VisualState::Shielded) => "#60c0ff",
        (SpriteKind::Player, _) => "#e0e0e0",
        (SpriteKind::Bullet, _) => "#ffe060",
        (SpriteKind::Enemy(EnemyKind::Standard), _) => "#a040ff",
        (SpriteKind::Enemy(EnemyKind::Large), _) => "#ff8000",
        (SpriteKind::PowerUp, _) => "#40ff80",
        (SpriteKind::Star, _) => "#ffffff",
        (SpriteKind::Explosion, _) => "#ffb020",
    }
}

/// Draw every renderable as a box, scaled from playfield to canvas pixels
pub fn draw(ctx: &CanvasRenderingContext2d, game: &Game, canvas_w: f64, canvas_h: f64) {
    let tuning = game.tuning();
    let sx = canvas_w / tuning.screen_width as f64;
    let sy = canvas_h / tuning.screen_height as f64;

    ctx.set_fill_style_str("#05051a");
    ctx.fill_rect(0.0, 0.0, canvas_w, canvas_h);

    for item in game.renderables() {
        let pos = item.position();
        let size = item.size();
        ctx.set_fill_style_str(sprite_color(item.sprite(), item.visual_state()));
        ctx.fill_rect(
            (pos.x - size.x / 2.0) as f64 * sx,
            (pos.y - size.y / 2.0) as f64 * sy,
            size.x as f64 * sx,
            size.y as f64 * sy,
        );
    }
}
