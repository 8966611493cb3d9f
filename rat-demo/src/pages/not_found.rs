use rat_dom::router::LINK_ATTRIBUTE;
use rat_dom::{children, el, Attr, Node};

/// Fallback for paths no other route matches.
pub fn not_found_page() -> rat_dom::Result<Node> {
    Ok(el(
        "div",
        [Attr::class("max-w-2xl mx-auto py-16 px-4 text-center")],
        children![
            el("h1", [Attr::class("text-4xl font-bold mb-4 text-gray-900")], children!["Not found"]),
            el("p", [Attr::class("text-gray-600 mb-8")], children!["Nothing lives at this address."]),
            el(
                "a",
                [Attr::attr("href", "/"), Attr::flag(LINK_ATTRIBUTE, true), Attr::class("text-blue-600")],
                children!["Back home"],
            ),
        ],
    ))
}
