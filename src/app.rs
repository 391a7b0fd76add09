//! The storefront page as an Elm-architecture app.
//!
//! `init` scans the page once and fills the registration table; `update`
//! routes every DOM event through it and turns replies and timer ticks into
//! page mutations.

use std::sync::Arc;

use storefront_http_manager::{post_form, FormBody, HttpError, HttpRequest, HttpResponse};

use crate::bindings::{Bindings, DomEvent, DomEventKind, EventType, Handler, Role};
use crate::cart::{self, AddReply, BadgeSlot, BadgeWrite, UpdateReply};
use crate::config::Settings;
use crate::cookie::get_cookie;
use crate::dom::{Document, NodeId};
use crate::error::CartError;
use crate::gallery::Gallery;
use crate::quantity::{QuantityControl, Step};
use crate::runtime::{command, Cmd};
use crate::toast::{Severity, ToastArea, ToastId};

pub struct Model {
    pub page: Document,
    pub settings: Arc<Settings>,
    pub bindings: Bindings,
    pub controls: Vec<QuantityControl>,
    pub gallery: Gallery,
    pub toasts: ToastArea,
    pub badge: BadgeSlot,
}

#[derive(Clone, Debug)]
pub enum Msg {
    Dom(DomEvent),
    CartItemUpdated(Result<UpdateReply, CartError>),
    AddedToCart {
        seq: u64,
        reply: Result<AddReply, CartError>,
    },
    HideToast(ToastId),
    ToastHidden(ToastId),
}

impl From<DomEvent> for Msg {
    fn from(event: DomEvent) -> Self {
        Msg::Dom(event)
    }
}

// Each toast owns two timer ids: auto-hide and fade-out.
fn autohide_timer(id: ToastId) -> u64 {
    id.0 * 2
}

fn fade_timer(id: ToastId) -> u64 {
    id.0 * 2 + 1
}

pub fn init(page: Document, settings: Arc<Settings>) -> (Model, Cmd<Msg>) {
    let mut bindings = Bindings::default();

    let controls = QuantityControl::discover(&page, &settings);
    for (index, control) in controls.iter().enumerate() {
        if let Some(minus) = control.minus {
            bindings.bind(minus, EventType::Click, Role::QuantityMinus(index));
        }
        if let Some(plus) = control.plus {
            bindings.bind(plus, EventType::Click, Role::QuantityPlus(index));
        }
        if let Some(input) = control.input {
            bindings.bind(input, EventType::Change, Role::QuantityInput(index));
        }
    }

    let forms = page.select_all(&settings.markers.cart_form);
    for form in &forms {
        bindings.bind(*form, EventType::Submit, Role::AddToCartForm);
    }

    let gallery = Gallery::discover(&page, &settings);
    for thumb in &gallery.thumbnails {
        bindings.bind(*thumb, EventType::Click, Role::Thumbnail);
    }

    tracing::info!(
        quantity_controls = controls.len(),
        cart_forms = forms.len(),
        thumbnails = gallery.thumbnails.len(),
        "storefront page wired"
    );

    let model = Model {
        page,
        settings,
        bindings,
        controls,
        gallery,
        toasts: ToastArea::default(),
        badge: BadgeSlot::default(),
    };
    (model, Cmd::none())
}

pub fn update(mut model: Model, msg: Msg) -> (Model, Cmd<Msg>) {
    match msg {
        Msg::Dom(event) => {
            let cmd = on_dom_event(&mut model, &event);
            (model, cmd)
        }
        Msg::CartItemUpdated(Ok(reply)) => {
            if reply.success {
                (model, command::reload())
            } else {
                tracing::warn!("cart update was not accepted; keeping local quantity");
                (model, Cmd::none())
            }
        }
        Msg::CartItemUpdated(Err(err)) => {
            tracing::error!(error = %err, "cart update failed");
            (model, Cmd::none())
        }
        Msg::AddedToCart { seq, reply } => {
            let cmd = on_added_to_cart(&mut model, seq, reply);
            (model, cmd)
        }
        Msg::HideToast(id) => {
            let cmd = hide_toast(&mut model, id);
            (model, cmd)
        }
        Msg::ToastHidden(id) => {
            if let Some(dismiss) = model.toasts.remove(&mut model.page, id) {
                model
                    .bindings
                    .unbind(dismiss, EventType::Click, Role::ToastDismiss(id));
            }
            (model, Cmd::none())
        }
    }
}

/// The page as it stands after the last update.
pub fn view(model: &Model) -> Document {
    model.page.clone()
}

fn on_dom_event(model: &mut Model, event: &DomEvent) -> Cmd<Msg> {
    // The field already holds the edited value when `change` fires.
    if let DomEventKind::Change { value } = &event.kind {
        model.page.set_value(event.target, value.as_str());
    }
    let handlers = model.bindings.dispatch(&model.page, event);
    let mut prevented = false;
    let mut cmds = Vec::with_capacity(handlers.len());
    for handler in handlers {
        let (cmd, prevent) = handle(model, handler, event);
        prevented |= prevent;
        cmds.push(cmd);
    }

    // A submission nobody intercepted is a normal page navigation.
    if event.kind == DomEventKind::Submit && !prevented {
        if let Some(form) = model.page.closest_tag(event.target, "form") {
            let (action, body) = cart::submission(&model.page, form);
            cmds.push(command::submit_form(action, body.encode()));
        }
    }
    Cmd::batch(cmds)
}

/// Run one bound role. The flag reports whether the default action was
/// prevented.
fn handle(model: &mut Model, handler: Handler, event: &DomEvent) -> (Cmd<Msg>, bool) {
    match handler.role {
        Role::QuantityMinus(index) => (step_quantity(model, index, Step::Decrement), false),
        Role::QuantityPlus(index) => (step_quantity(model, index, Step::Increment), false),
        Role::QuantityInput(index) => {
            let DomEventKind::Change { value } = &event.kind else {
                return (Cmd::none(), false);
            };
            let control = model.controls[index].clone();
            match control.edit(&mut model.page, value) {
                Some(_) => (update_cart_item(model, &control), false),
                None => (Cmd::none(), false),
            }
        }
        Role::AddToCartForm => {
            let form = handler.node;
            if !cart::is_async_form(&model.page, form, &model.settings) {
                return (Cmd::none(), false);
            }
            (submit_add_to_cart(model, form), true)
        }
        Role::Thumbnail => {
            model
                .gallery
                .select(&mut model.page, &model.settings, handler.node);
            (Cmd::none(), false)
        }
        Role::ToastDismiss(id) => (hide_toast(model, id), false),
    }
}

fn step_quantity(model: &mut Model, index: usize, step: Step) -> Cmd<Msg> {
    let control = model.controls[index].clone();
    match control.step(&mut model.page, step) {
        Some(_) => update_cart_item(model, &control),
        None => Cmd::none(),
    }
}

fn update_cart_item(model: &Model, control: &QuantityControl) -> Cmd<Msg> {
    let Some(update) = control.cart_update(&model.page, &model.settings) else {
        return Cmd::none();
    };
    let req = cart_post(model, update.action, &update.form, |reply| {
        Msg::CartItemUpdated(cart::decode_update_reply(reply))
    });
    command::http(req)
}

fn submit_add_to_cart(model: &mut Model, form: NodeId) -> Cmd<Msg> {
    let (action, body) = cart::submission(&model.page, form);
    let seq = model.badge.next_seq();
    let req = cart_post(model, action, &body, move |reply| Msg::AddedToCart {
        seq,
        reply: cart::decode_add_reply(reply),
    });
    command::http(req)
}

/// Programmatic form POST, with the CSRF header when one is configured and
/// the cookie is present.
fn cart_post(
    model: &Model,
    action: String,
    form: &FormBody,
    returns: impl Fn(Result<HttpResponse, HttpError>) -> Msg + Send + Sync + 'static,
) -> HttpRequest<Msg> {
    let mut req = post_form(action, form, returns).programmatic();
    if let Some(csrf) = &model.settings.config.csrf {
        if let Some(token) = get_cookie(model.page.cookie(), &csrf.cookie) {
            req = req.header(csrf.header.clone(), token);
        }
    }
    req
}

fn on_added_to_cart(model: &mut Model, seq: u64, reply: Result<AddReply, CartError>) -> Cmd<Msg> {
    match reply {
        Ok(reply) if reply.success => {
            match model
                .badge
                .write(&mut model.page, &model.settings, seq, &reply.cart_count)
            {
                BadgeWrite::Applied(_) => {}
                BadgeWrite::Stale => tracing::debug!(seq, "newer cart count already shown"),
                BadgeWrite::NoButton => tracing::debug!("no cart button to badge"),
            }
            let message = model.settings.config.cart.added_message.clone();
            show_toast(model, &message, Severity::Success)
        }
        Ok(_) => {
            tracing::warn!(seq, "add to cart was not accepted");
            Cmd::none()
        }
        Err(err) => {
            tracing::error!(seq, error = %err, "add to cart failed");
            let message = model.settings.config.cart.failed_message.clone();
            show_toast(model, &message, Severity::Error)
        }
    }
}

fn show_toast(model: &mut Model, message: &str, severity: Severity) -> Cmd<Msg> {
    let config = &model.settings.config.toast;
    let shown = model.toasts.show(&mut model.page, config, message, severity);
    model
        .bindings
        .bind(shown.dismiss, EventType::Click, Role::ToastDismiss(shown.id));
    if !config.autohide {
        return Cmd::none();
    }
    let id = shown.id;
    command::notify_after(autohide_timer(id), config.delay(), move || Msg::HideToast(id))
}

fn hide_toast(model: &mut Model, id: ToastId) -> Cmd<Msg> {
    if !model.toasts.hide(&mut model.page, id) {
        return Cmd::none();
    }
    let fade = model.settings.config.toast.fade();
    Cmd::batch([
        command::cancel_timer(autohide_timer(id)),
        command::notify_after(fade_timer(id), fade, move || Msg::ToastHidden(id)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CsrfConfig, StorefrontConfig};
    use crate::dom::el;
    use crate::runtime::Request;
    use storefront_core::{CoreRequest, Navigation};
    use storefront_http_manager::HttpMethod;
    use storefront_time_manager::TimeRequest;

    fn page() -> Document {
        Document::with_body(
            "https://shop.test/cart/",
            [
                el("a").class("btn btn-primary-yellow").text("Cart"),
                el("form")
                    .class("update-cart-form")
                    .attr("action", "/cart/update/3/")
                    .children([
                        el("input").attr("type", "hidden").attr("name", "csrfmiddlewaretoken").value("tok"),
                        el("div").class("quantity-control").children([
                            el("button").class("qty-minus").child(el("i").class("bi-dash")),
                            el("input").attr("name", "quantity").value("2"),
                            el("button").class("qty-plus"),
                        ]),
                    ]),
                el("form")
                    .class("add-to-cart-form")
                    .attr("action", "/cart/add/8/")
                    .attr("data-ajax", "true")
                    .children([
                        el("input").attr("name", "quantity").value("1"),
                        el("button").attr("type", "submit").text("Add"),
                    ]),
                el("form")
                    .class("add-to-cart-form")
                    .attr("action", "/cart/add/9/")
                    .child(el("input").attr("name", "quantity").value("2")),
                el("img").class("main-product-image").attr("src", "/media/a.jpg"),
                el("div").class("product-gallery").children([
                    el("img").class("thumbnail active").attr("src", "/media/a.jpg"),
                    el("img").class("thumbnail").attr("src", "/media/b.jpg"),
                ]),
            ],
        )
        .with_cookie("csrftoken=cookie%20tok")
    }

    fn start() -> Model {
        init(page(), Arc::new(Settings::default())).0
    }

    fn find(model: &Model, selector: &str) -> NodeId {
        model
            .page
            .select(&crate::dom::Selector::parse(selector).unwrap())
            .unwrap()
    }

    fn only_http(cmd: Cmd<Msg>) -> HttpRequest<Msg> {
        let mut reqs = cmd.into_inner();
        assert_eq!(reqs.len(), 1, "expected exactly one request");
        match reqs.remove(0) {
            Request::Http(req) => req,
            other => panic!("expected http request, got {other:?}"),
        }
    }

    fn json(body: &str) -> Result<HttpResponse, HttpError> {
        Ok(HttpResponse {
            status: 200,
            headers: vec![],
            body: body.as_bytes().to_vec(),
        })
    }

    #[test]
    fn init_registers_every_role() {
        let model = start();
        // minus, plus, input, two forms, two thumbnails
        assert_eq!(model.bindings.len(), 7);
        assert_eq!(model.controls.len(), 1);
    }

    #[test]
    fn increment_posts_update_with_new_quantity() {
        let model = start();
        let plus = find(&model, ".qty-plus");
        let (model, cmd) = update(model, DomEvent::click(plus).into());

        let input = model.controls[0].input.unwrap();
        assert_eq!(model.page.value(input), "3");
        let req = only_http(cmd);
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "/cart/update/3/");
        assert_eq!(req.body.as_deref(), Some(&b"csrfmiddlewaretoken=tok&quantity=3"[..]));
        assert!(req
            .headers
            .contains(&("X-Requested-With".to_string(), "XMLHttpRequest".to_string())));
    }

    #[test]
    fn click_on_icon_inside_minus_bubbles() {
        let model = start();
        let icon = find(&model, ".bi-dash");
        let (model, cmd) = update(model, DomEvent::click(icon).into());
        assert_eq!(model.page.value(model.controls[0].input.unwrap()), "1");
        only_http(cmd);

        let (model, cmd) = update(model, DomEvent::click(icon).into());
        assert_eq!(model.page.value(model.controls[0].input.unwrap()), "1");
        assert!(cmd.is_none());
    }

    #[test]
    fn change_coerces_and_posts() {
        let model = start();
        let input = model.controls[0].input.unwrap();
        let (model, cmd) = update(model, DomEvent::change(input, "0").into());
        assert_eq!(model.page.value(input), "1");
        let req = only_http(cmd);
        assert!(String::from_utf8_lossy(req.body.as_deref().unwrap()).ends_with("quantity=1"));
    }

    #[test]
    fn successful_update_reloads_and_failure_does_not() {
        let model = start();
        let plus = find(&model, ".qty-plus");
        let (model, cmd) = update(model, DomEvent::click(plus).into());
        let req = only_http(cmd);

        let (model, cmd) = update(model, (req.returns)(json(r#"{"success": true}"#)));
        assert!(matches!(
            cmd.requests(),
            [Request::Core(CoreRequest::Navigate(Navigation::Reload))]
        ));

        let (model, cmd) = update(model, (req.returns)(json(r#"{"success": false}"#)));
        assert!(cmd.is_none());
        let (model, cmd) = update(model, (req.returns)(Err(HttpError::new("offline"))));
        assert!(cmd.is_none());
        // local value stays as edited
        assert_eq!(model.page.value(model.controls[0].input.unwrap()), "3");
    }

    #[test]
    fn async_add_to_cart_updates_badge_and_toasts() {
        let model = start();
        let form = find(&model, ".add-to-cart-form");
        let (model, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);
        assert_eq!(req.url, "/cart/add/8/");
        assert_eq!(req.body.as_deref(), Some(&b"quantity=1"[..]));

        let (model, cmd) = update(model, (req.returns)(json(r#"{"success": true, "cart_count": 7}"#)));
        let badge = model.badge.node().expect("badge created");
        assert_eq!(model.page.text_content(badge), "7");
        let toast = model.toasts.live().next().expect("toast shown");
        let node = model.toasts.node(toast).unwrap();
        assert!(model.page.has_class(node, "bg-success"));
        assert_eq!(model.page.text_content(node), "Added to cart!");
        assert!(matches!(
            cmd.requests(),
            [Request::Time(TimeRequest::NotifyAfter { .. })]
        ));
    }

    #[test]
    fn add_to_cart_failure_shows_error_toast_without_badge() {
        let model = start();
        let form = find(&model, ".add-to-cart-form");
        let (model, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);

        let (model, _) = update(model, (req.returns)(Err(HttpError::new("offline"))));
        assert!(model.badge.node().is_none());
        let toast = model.toasts.live().next().unwrap();
        let node = model.toasts.node(toast).unwrap();
        assert!(model.page.has_class(node, "bg-danger"));
        assert_eq!(model.page.text_content(node), "Error adding to cart");
    }

    #[test]
    fn rejected_add_to_cart_is_silent() {
        let model = start();
        let form = find(&model, ".add-to-cart-form");
        let (model, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);
        let (model, cmd) = update(model, (req.returns)(json(r#"{"success": false}"#)));
        assert!(cmd.is_none());
        assert!(model.badge.node().is_none());
        assert_eq!(model.toasts.live().count(), 0);
    }

    fn replies_in_reverse(model: Model) -> Model {
        let form = find(&model, ".add-to-cart-form");
        let (model, first) = update(model, DomEvent::submit(form).into());
        let (model, second) = update(model, DomEvent::submit(form).into());
        let (first, second) = (only_http(first), only_http(second));

        let (model, _) = update(model, (second.returns)(json(r#"{"success": true, "cart_count": 2}"#)));
        let (model, _) = update(model, (first.returns)(json(r#"{"success": true, "cart_count": 1}"#)));
        model
    }

    #[test]
    fn last_reply_to_arrive_sets_the_badge() {
        let model = replies_in_reverse(start());
        assert_eq!(model.page.text_content(model.badge.node().unwrap()), "1");
        assert_eq!(model.toasts.live().count(), 2);
    }

    #[test]
    fn stale_reply_keeps_newer_badge_when_configured() {
        let mut config = StorefrontConfig::default();
        config.cart.discard_stale_counts = true;
        let model = init(page(), Arc::new(config.compile().unwrap())).0;
        let model = replies_in_reverse(model);
        assert_eq!(model.page.text_content(model.badge.node().unwrap()), "2");
        assert_eq!(model.toasts.live().count(), 2);
    }

    #[test]
    fn typed_value_is_posted_with_the_form() {
        let model = start();
        let form = find(&model, "form[data-ajax]");
        let input = find(&model, "form[data-ajax] input");
        let (model, cmd) = update(model, DomEvent::change(input, "5").into());
        assert!(cmd.is_none());
        assert_eq!(model.page.value(input), "5");

        let (_, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);
        assert_eq!(req.body.as_deref(), Some(&b"quantity=5"[..]));
    }

    #[test]
    fn typed_value_is_submitted_natively() {
        let model = start();
        let form = find(&model, "form[action=\"/cart/add/9/\"]");
        let input = find(&model, "form[action=\"/cart/add/9/\"] input");
        let (model, _) = update(model, DomEvent::change(input, "4").into());
        let (_, cmd) = update(model, DomEvent::submit(form).into());
        assert!(matches!(
            cmd.requests(),
            [Request::Core(CoreRequest::Navigate(Navigation::Submit { body, .. }))] if body == "quantity=4"
        ));
    }

    #[test]
    fn plain_form_submits_natively() {
        let model = start();
        let forms = model.page.select_all(&model.settings.markers.cart_form);
        let (_, cmd) = update(model, DomEvent::submit(forms[1]).into());
        assert_eq!(
            cmd.requests().len(),
            1,
            "native submission should be the only effect"
        );
        match &cmd.requests()[0] {
            Request::Core(CoreRequest::Navigate(Navigation::Submit { url, body })) => {
                assert_eq!(url, "/cart/add/9/");
                assert_eq!(body, "quantity=2");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn thumbnail_click_switches_image() {
        let model = start();
        let thumbs = model.gallery.thumbnails.clone();
        let (model, cmd) = update(model, DomEvent::click(thumbs[1]).into());
        assert!(cmd.is_none());
        let main = model.gallery.main_image.unwrap();
        assert_eq!(model.page.attr(main, "src"), Some("/media/b.jpg"));
        assert!(!model.page.has_class(thumbs[0], "active"));
        assert!(model.page.has_class(thumbs[1], "active"));
    }

    #[test]
    fn unbound_elements_are_ignored() {
        let model = start();
        let image = find(&model, ".main-product-image");
        let (_, cmd) = update(model, DomEvent::click(image).into());
        assert!(cmd.is_none());
    }

    #[test]
    fn dismiss_hides_then_removes_toast() {
        let model = start();
        let form = find(&model, ".add-to-cart-form");
        let (model, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);
        let (model, _) = update(model, (req.returns)(Err(HttpError::new("offline"))));
        let id = model.toasts.live().next().unwrap();
        let node = model.toasts.node(id).unwrap();
        let dismiss = find(&model, ".btn-close");

        let (model, cmd) = update(model, DomEvent::click(dismiss).into());
        assert!(!model.page.has_class(node, "show"));
        assert!(matches!(
            cmd.requests(),
            [
                Request::Time(TimeRequest::Cancel { .. }),
                Request::Time(TimeRequest::NotifyAfter { .. })
            ]
        ));

        let (model, _) = update(model, Msg::ToastHidden(id));
        assert!(!model.page.is_connected(node));
        let (model, cmd) = update(model, DomEvent::click(dismiss).into());
        assert!(cmd.is_none());
        assert_eq!(model.bindings.len(), 7);
    }

    #[test]
    fn csrf_header_comes_from_cookie_when_configured() {
        let config = StorefrontConfig {
            csrf: Some(CsrfConfig::default()),
            ..StorefrontConfig::default()
        };
        let model = init(page(), Arc::new(config.compile().unwrap())).0;
        let form = find(&model, ".add-to-cart-form");
        let (_, cmd) = update(model, DomEvent::submit(form).into());
        let req = only_http(cmd);
        assert!(req
            .headers
            .contains(&("X-CSRFToken".to_string(), "cookie tok".to_string())));
    }
}
