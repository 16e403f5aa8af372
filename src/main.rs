//! Star Shooter entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement, KeyboardEvent,
        PointerEvent, TouchEvent,
    };

    use star_shooter::platform::web;
    use star_shooter::sim::Command;
    use star_shooter::{Game, HudSnapshot, Leaderboard, ScoreEntry, ScoreError, Tuning};

    /// Browser-side wrapper: the driver plus what the DOM needs
    struct App {
        game: Game,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        /// Last HUD written, to skip redundant DOM updates
        last_hud: Option<HudSnapshot>,
        /// Whether the name form is showing
        form_open: bool,
    }

    impl App {
        /// Convert a canvas-relative CSS position to playfield coordinates
        fn to_playfield(&self, x: f64, y: f64) -> (f32, f32) {
            let tuning = self.game.tuning();
            let w = self.canvas.client_width().max(1) as f64;
            let h = self.canvas.client_height().max(1) as f64;
            (
                (x / w) as f32 * tuning.screen_width,
                (y / h) as f32 * tuning.screen_height,
            )
        }

        fn frame(&mut self, time: f64) {
            self.game.frame(time);
            web::draw(
                &self.ctx,
                &self.game,
                self.canvas.width() as f64,
                self.canvas.height() as f64,
            );
            self.update_hud();
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let hud = self.game.hud();
            if self.last_hud.as_ref() == Some(&hud) && self.form_open == self.game.score_offer().is_some() {
                return;
            }
            let Some(document) = document() else {
                return;
            };

            set_text(&document, "#hud-score .hud-value", &hud.score.to_string());
            set_text(
                &document,
                "#hud-health .hud-value",
                &format!("{}/{}", hud.health, hud.max_health),
            );
            set_text(
                &document,
                "#hud-shield .hud-value",
                if hud.shield { "ON" } else { "OFF" },
            );
            match (hud.energy, hud.max_energy) {
                (Some(energy), Some(max)) => {
                    set_visible(&document, "hud-energy", true);
                    set_text(&document, "#hud-energy .hud-value", &format!("{}/{}", energy, max));
                }
                _ => set_visible(&document, "hud-energy", false),
            }

            let loading = !hud.running && !hud.paused && !hud.game_over;
            set_visible(&document, "start-prompt", loading);
            set_visible(&document, "pause-menu", hud.paused);
            set_visible(&document, "game-over", hud.game_over);
            if hud.game_over {
                if let Some(el) = document.get_element_by_id("final-score") {
                    el.set_text_content(Some(&hud.score.to_string()));
                }
            }

            let offer = self.game.score_offer().is_some();
            if offer != self.form_open {
                set_visible(&document, "score-form", offer);
                if offer {
                    set_status(&document, "New high score! Enter your name.");
                }
                self.form_open = offer;
            }

            self.last_hud = Some(hud);
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, selector: &str, text: &str) {
        if let Some(el) = document.query_selector(selector).ok().flatten() {
            el.set_text_content(Some(text));
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_status(document: &Document, text: &str) {
        if let Some(el) = document.get_element_by_id("score-status") {
            el.set_text_content(Some(text));
        }
    }

    fn render_leaderboard(board: &Leaderboard) {
        let Some(document) = document() else {
            return;
        };
        let Some(list) = document.get_element_by_id("leaderboard-list") else {
            return;
        };
        list.set_inner_html("");
        for entry in board.top(star_shooter::highscores::MAX_HIGH_SCORES) {
            if let Ok(item) = document.create_element("li") {
                item.set_text_content(Some(&format!("{} - {}", entry.name, entry.score)));
                let _ = list.append_child(&item);
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }

        log::info!("Star Shooter starting...");

        let Some(document) = document() else {
            log::error!("No document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No canvas element");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("No 2d context");
            return;
        };

        let tuning = Tuning::load();
        canvas.set_width(tuning.screen_width as u32);
        canvas.set_height(tuning.screen_height as u32);

        let seed = js_sys::Date::now() as u64;
        let mut game = Game::new(seed, tuning);
        let cached = Leaderboard::load_cached();
        render_leaderboard(&cached);
        game.set_leaderboard(cached);

        let app = Rc::new(RefCell::new(App {
            game,
            canvas: canvas.clone(),
            ctx,
            last_hud: None,
            form_open: false,
        }));

        // Hide loading indicator
        set_visible(&document, "loading", false);
        set_visible(&document, "hud", true);

        setup_input_handlers(&canvas, app.clone());
        setup_buttons(app.clone());
        setup_auto_pause(app.clone());
        fetch_leaderboard(app.clone());

        // Start game loop
        request_animation_frame(app);

        log::info!("Star Shooter running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Pointer move (mouse, pen and touch)
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut a = app.borrow_mut();
                let (x, y) = a.to_playfield(event.offset_x() as f64, event.offset_y() as f64);
                a.game.pointer_move(x, y);
            });
            let _ = canvas
                .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pointer down/up fire
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.fire_down();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: PointerEvent| {
                app.borrow_mut().game.fire_up();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keep touch drags from scrolling the page
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        let Some(window) = web_sys::window() else {
            return;
        };

        // Keyboard
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                // Typing a name must not steer the ship
                if app.borrow().form_open {
                    return;
                }
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    "x" | "X" | " " => {
                        event.prevent_default();
                        a.game.fire_down();
                    }
                    "Enter" => {
                        a.game.confirm();
                    }
                    "Escape" | "p" | "P" => {
                        a.game.command(Command::TogglePause);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if matches!(event.key().as_str(), "x" | "X" | " ") {
                    app.borrow_mut().game.fire_up();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }

    /// Fetch the board from the score service, falling back to the cache
    fn fetch_leaderboard(app: Rc<RefCell<App>>) {
        let client = app.borrow().game.score_client();
        wasm_bindgen_futures::spawn_local(async move {
            let result = match web::send(&client.fetch_request()).await {
                Ok(response) => client.parse_fetch_response(&response),
                Err(e) => Err(e),
            };
            match result {
                Ok(board) => {
                    render_leaderboard(&board);
                    board.save_cached();
                    app.borrow_mut().game.set_leaderboard(board);
                }
                Err(e) => log::warn!("Could not fetch high scores: {}", e),
            }
        });
    }

    /// Submit the pending score under `name`; failures are shown, not retried
    fn submit_score(app: Rc<RefCell<App>>, name: String) {
        let (client, entry) = {
            let a = app.borrow();
            (a.game.score_client(), a.game.submission(&name))
        };
        let entry: ScoreEntry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                if let Some(document) = document() {
                    set_status(&document, &e.to_string());
                }
                return;
            }
        };

        wasm_bindgen_futures::spawn_local(async move {
            let result: Result<(), ScoreError> = match web::send(&client.submit_request(&entry)).await {
                Ok(response) => client.parse_submit_response(&response),
                Err(e) => Err(e),
            };
            let Some(document) = document() else {
                return;
            };
            match result {
                Ok(()) => {
                    log::info!("Submitted score {} for {}", entry.score, entry.name);
                    set_status(&document, "Score submitted!");
                    let mut a = app.borrow_mut();
                    a.game.submitted(entry);
                    render_leaderboard(a.game.leaderboard());
                }
                Err(e) => {
                    log::warn!("Score submission failed: {}", e);
                    set_status(&document, "Could not submit score.");
                }
            }
        });
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let Some(doc) = document() else {
            return;
        };

        // Restart button
        if let Some(btn) = doc.get_element_by_id("restart-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.command(Command::Restart);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Resume button
        if let Some(btn) = doc.get_element_by_id("resume-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.command(Command::Resume);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Start button
        if let Some(btn) = doc.get_element_by_id("start-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.command(Command::Start);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // High score submit
        if let Some(btn) = doc.get_element_by_id("submit-score-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let name = document()
                    .and_then(|d| d.get_element_by_id("score-name"))
                    .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
                    .map(|input| input.value())
                    .unwrap_or_default();
                submit_score(app.clone(), name);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Skip submission
        if let Some(btn) = doc.get_element_by_id("skip-score-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                app.borrow_mut().game.dismiss_offer();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let command = if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    Command::Hidden
                } else {
                    Command::Visible
                };
                app.borrow_mut().game.command(command);
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                a.game.fire_up();
                a.game.command(Command::Hidden);
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Star Shooter (native) starting...");
    log::info!("Native mode runs a headless autopilot round - run with `trunk serve` for the web version");

    autopilot_round();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Play one round with a simple autopilot and submit the result to an
/// in-process score store
#[cfg(not(target_arch = "wasm32"))]
fn autopilot_round() {
    use star_shooter::consts::FRAME_MS;
    use star_shooter::score_client::MemoryScoreStore;
    use star_shooter::{Game, Tuning};

    /// Give up after five minutes of simulated play
    const MAX_FRAMES: u32 = 5 * 60 * 60;

    let tuning = Tuning::load();
    let seed = std::env::var("STAR_SHOOTER_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let mut game = Game::new(seed, tuning);
    game.confirm();

    let lane_y = game.tuning().screen_height - game.tuning().player_size;
    let mut frames = 0;
    while frames < MAX_FRAMES && !game.hud().game_over {
        // Sit under the lowest enemy and keep firing
        let target_x = game
            .state()
            .world
            .enemies
            .iter_active()
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|enemy| enemy.pos.x);
        if let Some(x) = target_x {
            game.pointer_move(x, lane_y);
        }
        // Re-press every frame so energy guns keep firing too
        game.fire_up();
        game.fire_down();
        game.frame(frames as f64 * FRAME_MS);
        frames += 1;
    }

    let hud = game.hud();
    log::info!(
        "Round finished after {:.1}s: score {}, health {}/{}",
        frames as f64 * FRAME_MS / 1000.0,
        hud.score,
        hud.health,
        hud.max_health
    );

    let client = game.score_client();
    let mut store = MemoryScoreStore::new();
    match game.submission("Autopilot") {
        Ok(entry) => {
            let response = store.handle(&client.submit_request(&entry));
            match client.parse_submit_response(&response) {
                Ok(()) => game.submitted(entry),
                Err(e) => log::warn!("Submission rejected: {}", e),
            }
        }
        Err(e) => log::info!("Nothing submitted: {}", e),
    }

    match client.parse_fetch_response(&store.handle(&client.fetch_request())) {
        Ok(board) => {
            for (rank, entry) in board.entries().iter().enumerate() {
                println!("{:>2}. {:<16} {}", rank + 1, entry.name, entry.score);
            }
        }
        Err(e) => log::warn!("Could not read scores back: {}", e),
    }
}
