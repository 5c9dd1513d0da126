// Code generated by trellis; DO NOT EDIT.

use std::collections::BTreeMap;
use trellis::routes::{CustomRender, DataRoute, DefaultHandler, DefaultRender, Registry};

use crate::site::about as about;
use crate::site::api as api;
use crate::site::cards as cards;

pub fn data_routes() -> BTreeMap<String, DataRoute> {
    BTreeMap::from([
        ("about".to_string(), DataRoute::new(&about::data::DATA, ["index.html", "about/page.html"])),
    ])
}

pub fn render_custom_list() -> Vec<CustomRender> {
    vec![
        CustomRender::new("cards::render::sitemap_", cards::render::sitemap_),
    ]
}

pub fn render_default_list() -> Vec<DefaultRender> {
    vec![
        DefaultRender::new("/cards/card", cards::render::card),
    ]
}

pub fn handler_default_list() -> Vec<DefaultHandler> {
    vec![
        DefaultHandler::new("/api", api::handler::handler),
        DefaultHandler::new("/api/status", api::handler::status),
    ]
}

pub fn registry() -> Registry {
    Registry::new(
        data_routes(),
        render_custom_list(),
        render_default_list(),
        handler_default_list(),
    )
}
