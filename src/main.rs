//! Runaway Ask entry point
//!
//! On the web the DOM is the renderer: this binary wires browser events to a
//! [`runaway_ask::sim::Session`] and applies what it decides. Natively it runs
//! a scripted session with a simulated pointer chasing the No button.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, MouseEvent, PointerEvent};

    use runaway_ask::sim::{Relocation, Session, Visibility};
    use runaway_ask::{Config, Point, Rect, Size};

    const YES_ID: &str = "yes-btn";
    const NO_ID: &str = "no-btn";
    const TEASE_ID: &str = "tease";

    /// App instance holding the session and page clock
    struct App {
        session: Session,
        /// `performance.now()` at session start
        origin_ms: Option<f64>,
        last_visibility: Option<Visibility>,
    }

    impl App {
        fn new(seed: u64) -> Self {
            Self {
                session: Session::new(&Config::default(), seed),
                origin_ms: None,
                last_visibility: None,
            }
        }

        /// Session time for a page timestamp
        fn session_ms(&mut self, page_ms: f64) -> f64 {
            let origin = *self.origin_ms.get_or_insert(page_ms);
            page_ms - origin
        }

        fn update(&mut self, page_ms: f64) {
            let now = self.session_ms(page_ms);
            self.session.advance(now);

            let visibility = self.session.visibility();
            if self.last_visibility != Some(visibility) {
                apply_visibility(&visibility);
                self.last_visibility = Some(visibility);
            }

            let tease = self.session.tease().map(|t| (t.message.clone(), t.position));
            apply_tease(tease);
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn element_rect(id: &str) -> Option<Rect> {
        let r = document()?.get_element_by_id(id)?.get_bounding_client_rect();
        Some(Rect::new(
            r.left() as f32,
            r.top() as f32,
            r.width() as f32,
            r.height() as f32,
        ))
    }

    fn viewport() -> Size {
        let window = web_sys::window();
        let dim = |v: Option<Result<JsValue, JsValue>>| {
            v.and_then(|v| v.ok()).and_then(|v| v.as_f64()).unwrap_or(0.0) as f32
        };
        Size::new(
            dim(window.as_ref().map(|w| w.inner_width())),
            dim(window.as_ref().map(|w| w.inner_height())),
        )
    }

    fn html_element(id: &str) -> Option<HtmlElement> {
        document()?.get_element_by_id(id)?.dyn_into().ok()
    }

    fn set_hidden(id: &str, hidden: bool) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn apply_visibility(v: &Visibility) {
        set_hidden("flower", !v.flower);
        set_hidden("greeting", !v.greeting);
        set_hidden("prompt", !v.prompt);
        set_hidden("celebration", !v.celebration);
    }

    fn apply_tease(tease: Option<(String, Point)>) {
        let Some(el) = html_element(TEASE_ID) else {
            return;
        };
        match tease {
            Some((message, pos)) => {
                el.set_text_content(Some(&message));
                let style = el.style();
                let _ = style.set_property("left", &format!("{}px", pos.x));
                let _ = style.set_property("top", &format!("{}px", pos.y));
                let _ = el.class_list().remove_1("hidden");
            }
            None => {
                let _ = el.class_list().add_1("hidden");
            }
        }
    }

    fn apply_relocation(r: &Relocation) {
        let (Some(el), Some(pos)) = (html_element(NO_ID), r.position) else {
            return;
        };
        let style = el.style();
        if let Some(start) = r.start_position {
            // Pin at the inline spot first so the escape animates from there
            let _ = el.class_list().add_1("escaped");
            let _ = style.set_property("left", &format!("{}px", start.x));
            let _ = style.set_property("top", &format!("{}px", start.y));
            let _ = el.offset_width();
        }
        let _ = style.set_property("transition-duration", &format!("{}s", r.duration_secs));
        let _ = style.set_property("left", &format!("{}px", pos.x));
        let _ = style.set_property("top", &format!("{}px", pos.y));
        let _ = style.set_property("transform", &format!("rotate({}deg)", r.rotation_deg));
        log::debug!("No button -> ({:.0}, {:.0})", pos.x, pos.y);
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Runaway Ask starting...");

        let seed = js_sys::Date::now() as u64;
        let app = Rc::new(RefCell::new(App::new(seed)));
        app.borrow_mut().session.subscribe(|change| {
            log::info!("Phase: {} -> {}", change.from.label(), change.to.label());
        });

        setup_pointer_tracking(app.clone());
        setup_buttons(app.clone());
        setup_teardown(app.clone());

        request_animation_frame(app);

        log::info!("Runaway Ask running!");
    }

    fn setup_pointer_tracking(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            let pointer = Point::new(event.client_x() as f32, event.client_y() as f32);
            let no = element_rect(NO_ID);
            let yes = element_rect(YES_ID);
            let relocation =
                app.borrow_mut()
                    .session
                    .pointer_move(pointer, no.as_ref(), yes.as_ref(), viewport());
            if let Some(r) = relocation {
                apply_relocation(&r);
            }
        });
        let _ = window
            .add_event_listener_with_callback("pointermove", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = document() else {
            return;
        };

        if let Some(btn) = document.get_element_by_id(YES_ID) {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().session.accept();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Clicking or tapping No also makes it run
        if let Some(btn) = document.get_element_by_id(NO_ID) {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                event.prevent_default();
                let no = element_rect(NO_ID);
                let yes = element_rect(YES_ID);
                let relocation =
                    app.borrow_mut()
                        .session
                        .press_runaway(no.as_ref(), yes.as_ref(), viewport());
                if let Some(r) = relocation {
                    apply_relocation(&r);
                }
            });
            let _ = btn
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_teardown(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().session.teardown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            frame(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame(app: Rc<RefCell<App>>, time: f64) {
        let keep_going = {
            let mut a = app.borrow_mut();
            a.update(time);
            !a.session.phases().is_torn_down()
        };

        if keep_going {
            request_animation_frame(app);
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    log::info!("Runaway Ask (native) starting...");

    // Usage: runaway-ask [seed] [config.json]
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(s) => s.parse()?,
        None => 7,
    };
    let config = match args.next() {
        Some(path) => runaway_ask::Config::from_json(&std::fs::read_to_string(path)?)?,
        None => runaway_ask::Config::default(),
    };

    demo::run(&config, seed);
    Ok(())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless scripted session
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use runaway_ask::sim::Session;
    use runaway_ask::{Config, Point, Rect, Size};

    const VIEWPORT: Size = Size::new(1280.0, 720.0);
    const FRAME_MS: f64 = 16.0;
    /// Simulated pointer speed (px per frame)
    const POINTER_SPEED: f32 = 14.0;
    /// The pursuer gives up and clicks Yes at this time
    const ACCEPT_AT_MS: f64 = 12_000.0;

    pub fn run(config: &Config, seed: u64) {
        let mut session = Session::new(config, seed);
        session.subscribe(|change| {
            println!(
                "[{:>6.0} ms] phase {} -> {}",
                change.at_ms,
                change.from.label(),
                change.to.label()
            );
        });

        let yes = Rect::new(520.0, 420.0, 110.0, 48.0);
        let mut no = Rect::new(650.0, 420.0, 100.0, 48.0);
        let mut pointer = Point::new(80.0, 680.0);
        let mut now = 0.0;

        while now <= ACCEPT_AT_MS {
            session.advance(now);

            // Chase the No button's center
            let to_target = no.center() - pointer;
            pointer += to_target.clamp_length_max(POINTER_SPEED);

            if let Some(r) = session.pointer_move(pointer, Some(&no), Some(&yes), VIEWPORT) {
                match r.position {
                    Some(pos) => {
                        println!(
                            "[{:>6.0} ms] attempt {:>2}: No ({:.0}, {:.0}) -> ({:.0}, {:.0}) over {:.2}s{}",
                            now,
                            r.attempt,
                            no.left,
                            no.top,
                            pos.x,
                            pos.y,
                            r.duration_secs,
                            r.tease
                                .as_ref()
                                .map(|t| format!("  \"{}\"", t.message))
                                .unwrap_or_default()
                        );
                        no = Rect::from_origin(pos, no.size());
                    }
                    None => log::warn!("Attempt {} produced no position", r.attempt),
                }
            }

            now += FRAME_MS;
        }

        session.accept();
        println!(
            "Resolved after {} runaway attempts (seed {})",
            session.runaway().state().attempt_count,
            session.seed()
        );
        session.teardown();
    }
}
