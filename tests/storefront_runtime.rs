// Drives the full storefront runtime against a scripted transport with
// paused time, reading the rendered page back from the view slot.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use storefront::{build_runtime, el, Document, DomEvent, Exit, Navigation, Selector, Settings};
use storefront_core::ViewSlot;
use storefront_http_manager::{HttpError, HttpResponse, OutboundRequest, Transport};
use tokio::runtime::Builder;

struct Reply {
    delay: Duration,
    body: Result<&'static str, &'static str>,
}

fn reply(delay_ms: u64, body: &'static str) -> Reply {
    Reply {
        delay: Duration::from_millis(delay_ms),
        body: Ok(body),
    }
}

/// Answers requests in call order from a fixed script.
struct Scripted {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<OutboundRequest>>,
}

impl Scripted {
    fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for Scripted {
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse, HttpError> {
        self.seen.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        let Some(next) = next else {
            return Err(HttpError::new("script exhausted"));
        };
        tokio::time::sleep(next.delay).await;
        match next.body {
            Ok(body) => Ok(HttpResponse {
                status: 200,
                headers: vec![],
                body: body.as_bytes().to_vec(),
            }),
            Err(message) => Err(HttpError::new(message)),
        }
    }
}

fn product_page() -> Document {
    Document::with_body(
        "https://shop.test/products/8/",
        [
            el("a").class("btn btn-primary-yellow").text("Cart"),
            el("form")
                .class("update-cart-form")
                .attr("action", "/cart/update/3/")
                .child(el("div").class("quantity-control").children([
                    el("button").class("qty-minus"),
                    el("input").attr("name", "quantity").value("1"),
                    el("button").class("qty-plus"),
                ])),
            el("form")
                .class("add-to-cart-form")
                .attr("action", "/cart/add/8/")
                .attr("data-ajax", "true")
                .child(el("input").attr("name", "quantity").value("2")),
            el("form")
                .class("add-to-cart-form")
                .attr("action", "/cart/add/9/")
                .child(el("input").attr("name", "quantity").value("1")),
        ],
    )
}

fn find(doc: &Document, selector: &str) -> storefront::NodeId {
    doc.select(&Selector::parse(selector).unwrap())
        .unwrap_or_else(|| panic!("{selector} not on page"))
}

fn latest(slot: &ViewSlot<Document>) -> Document {
    slot.lock().unwrap().clone().expect("page rendered")
}

fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
    let rt = Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    rt.block_on(async {
        tokio::time::pause();
        tokio::time::timeout(Duration::from_secs(60), fut)
            .await
            .expect("runtime should finish")
    })
}

#[test]
fn add_to_cart_badges_and_toasts_then_toast_expires() {
    let page = product_page();
    let form = find(&page, "form[data-ajax]");
    let slot: ViewSlot<Document> = Default::default();
    let transport = Scripted::new([reply(20, r#"{"success": true, "cart_count": 7}"#)]);
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot.clone())
        .with_transport(transport.clone());
    let ports = runtime.ports();

    let driver = async {
        ports.dom.send(DomEvent::submit(form));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let page = latest(&slot);
        assert_eq!(page.text_content(find(&page, ".btn-primary-yellow .badge")), "7");
        let toast = find(&page, "#toast-container .toast");
        assert!(page.has_class(toast, "show"));
        assert!(page.has_class(toast, "bg-success"));

        tokio::time::sleep(Duration::from_secs(6)).await;
        let page = latest(&slot);
        assert!(page.select(&Selector::parse(".toast").unwrap()).is_none());
        // the badge outlives the toast
        assert_eq!(page.text_content(find(&page, ".badge")), "7");
        ports.shutdown();
    };

    let (exit, ()) = block_on(async { tokio::join!(runtime.run(), driver) });
    assert_eq!(exit, Exit::Shutdown);

    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, "/cart/add/8/");
    assert_eq!(seen[0].body_text(), "quantity=2");
    assert_eq!(seen[0].header("X-Requested-With"), Some("XMLHttpRequest"));
}

#[test]
fn slow_reply_overwrites_the_badge_when_it_lands() {
    let page = product_page();
    let form = find(&page, "form[data-ajax]");
    let slot: ViewSlot<Document> = Default::default();
    let transport = Scripted::new([
        reply(300, r#"{"success": true, "cart_count": 1}"#),
        reply(10, r#"{"success": true, "cart_count": 2}"#),
    ]);
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot.clone())
        .with_transport(transport);
    let ports = runtime.ports();

    let driver = async {
        ports.dom.send(DomEvent::submit(form));
        ports.dom.send(DomEvent::submit(form));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let page = latest(&slot);
        assert_eq!(page.text_content(find(&page, ".badge")), "2");

        tokio::time::sleep(Duration::from_millis(500)).await;
        let page = latest(&slot);
        assert_eq!(page.text_content(find(&page, ".badge")), "1");
        ports.shutdown();
    };

    let (exit, ()) = block_on(async { tokio::join!(runtime.run(), driver) });
    assert_eq!(exit, Exit::Shutdown);
}

#[test]
fn failed_add_to_cart_shows_error_toast() {
    let page = product_page();
    let form = find(&page, "form[data-ajax]");
    let slot: ViewSlot<Document> = Default::default();
    let transport = Scripted::new([Reply {
        delay: Duration::from_millis(5),
        body: Err("connection refused"),
    }]);
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot.clone())
        .with_transport(transport);
    let ports = runtime.ports();

    let driver = async {
        ports.dom.send(DomEvent::submit(form));
        tokio::time::sleep(Duration::from_millis(50)).await;
        let page = latest(&slot);
        let toast = find(&page, ".toast");
        assert!(page.has_class(toast, "bg-danger"));
        assert_eq!(page.text_content(toast), "Error adding to cart");
        assert!(page.select(&Selector::parse(".badge").unwrap()).is_none());
        ports.shutdown();
    };

    let (exit, ()) = block_on(async { tokio::join!(runtime.run(), driver) });
    assert_eq!(exit, Exit::Shutdown);
}

#[test]
fn accepted_quantity_change_reloads_the_page() {
    let page = product_page();
    let plus = find(&page, ".qty-plus");
    let slot: ViewSlot<Document> = Default::default();
    let transport = Scripted::new([reply(15, r#"{"success": true}"#)]);
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot.clone())
        .with_transport(transport.clone());
    let ports = runtime.ports();

    let navigations = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&navigations);
    ports
        .navigation
        .subscribe(move |nav| captured.lock().unwrap().push(nav));
    ports.dom.send(DomEvent::click(plus));

    let exit = block_on(runtime.run());
    assert_eq!(exit, Exit::Navigated(Navigation::Reload));
    assert_eq!(&*navigations.lock().unwrap(), &[Navigation::Reload]);

    let page = latest(&slot);
    assert_eq!(page.value(find(&page, ".quantity-control input")), "2");
    let seen = transport.seen.lock().unwrap();
    assert_eq!(seen[0].url, "/cart/update/3/");
    assert_eq!(seen[0].body_text(), "quantity=2");
}

#[test]
fn rejected_quantity_change_keeps_running() {
    let page = product_page();
    let plus = find(&page, ".qty-plus");
    let slot: ViewSlot<Document> = Default::default();
    let transport = Scripted::new([reply(15, r#"{"success": false}"#)]);
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot.clone())
        .with_transport(transport);
    let ports = runtime.ports();

    let driver = async {
        ports.dom.send(DomEvent::click(plus));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let page = latest(&slot);
        assert_eq!(page.value(find(&page, ".quantity-control input")), "2");
        ports.shutdown();
    };

    let (exit, ()) = block_on(async { tokio::join!(runtime.run(), driver) });
    assert_eq!(exit, Exit::Shutdown);
}

#[test]
fn plain_add_to_cart_form_navigates() {
    let page = product_page();
    let form = find(&page, "form[action=\"/cart/add/9/\"]");
    let slot: ViewSlot<Document> = Default::default();
    let runtime = build_runtime(page, Arc::new(Settings::default()), slot);
    let ports = runtime.ports();
    ports.dom.send(DomEvent::submit(form));

    let exit = block_on(runtime.run());
    assert_eq!(
        exit,
        Exit::Navigated(Navigation::Submit {
            url: "/cart/add/9/".into(),
            body: "quantity=1".into(),
        })
    );
}
