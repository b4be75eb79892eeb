//! End-to-end runs of the scraping pipeline over captured result pages.
//!
//! Every test drives a [`ReplaySurface`] so no browser or network is
//! involved. The fixtures under `tests/fixtures/` mimic the live markup:
//! a consent overlay, a filter sidebar, card variants and a "next" link.

use std::sync::Arc;

use pgscout_core::{Query, ScrapeOptions};
use pgscout_scraper::{
    BrowsingSurface, CompiledPatterns, ReplayLauncher, ReplaySurface, Scout, SurfaceLauncher,
    Timing,
};

const HOME: &str = "https://www.paginegialle.it/";
const BASE_P1: &str = "https://www.paginegialle.it/ricerca/ristoranti/milano";
const TERM_P1: &str = "https://www.paginegialle.it/ricerca/ristoranti%20milano/milano";
const TERM_P2: &str = "https://www.paginegialle.it/ricerca/ristoranti%20milano/milano/p-2";

const PAGE_1: &str = include_str!("fixtures/ristoranti_milano_p1.html");
const PAGE_2: &str = include_str!("fixtures/ristoranti_milano_p2.html");
const HOME_PAGE: &str = include_str!("fixtures/home.html");

fn scout() -> Scout {
    let patterns = CompiledPatterns::builtin().expect("built-in patterns compile");
    Scout::new(Arc::new(patterns), Timing::default())
}

fn ristoranti() -> Query {
    Query::new("ristoranti", None, None).expect("valid query")
}

fn captured_site() -> ReplaySurface {
    ReplaySurface::new()
        .route(BASE_P1, PAGE_1)
        .route(TERM_P1, PAGE_1)
        .route(TERM_P2, PAGE_2)
}

// ---------------------------------------------------------------------------
// synonyms
// ---------------------------------------------------------------------------

#[tokio::test]
async fn synonyms_from_filter_sidebar() {
    let mut surface = captured_site();
    let synonyms = scout()
        .synonyms(&mut surface, &ristoranti(), 12)
        .await
        .expect("synonyms");

    assert_eq!(synonyms, vec!["Pizzerie", "Trattorie", "Sushi bar"]);
    assert_eq!(surface.clicks().len(), 1, "consent overlay dismissed");
}

// ---------------------------------------------------------------------------
// scrape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scrape_walks_both_pages_and_drops_nameless_cards() {
    let mut surface = captured_site();
    let options = ScrapeOptions {
        use_synonyms: false,
        ..ScrapeOptions::default()
    };
    let records = scout()
        .scrape(&mut surface, &ristoranti(), options)
        .await
        .expect("scrape");

    let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Trattoria da Gino",
            "Pizzeria Luna Rossa",
            "Osteria del Borgo",
            "Ristorante Il Navigli",
        ]
    );
    assert!(records.iter().all(|r| r.term == "ristoranti"));

    assert_eq!(records[0].phone, "+390245678901");
    assert_eq!(records[0].address, "Via Lecco 12, 20124 Milano (MI)");
    assert!(records[1].phone.is_empty());
    assert_eq!(records[2].address, "Via Paolo Sarpi 8, 20154 Milano (MI)");
    assert!(records[3].address.is_empty());
}

#[tokio::test]
async fn scrape_respects_page_budget() {
    let mut surface = captured_site();
    let options = ScrapeOptions {
        max_pages: 1,
        use_synonyms: false,
        ..ScrapeOptions::default()
    };
    let records = scout()
        .scrape(&mut surface, &ristoranti(), options)
        .await
        .expect("scrape");

    assert_eq!(records.len(), 2);
    assert!(!surface.history().iter().any(|url| url == TERM_P2));
}

#[tokio::test]
async fn scrape_reaches_results_through_search_form() {
    let mut surface = ReplaySurface::new()
        .route(HOME, HOME_PAGE)
        .route(TERM_P2, PAGE_2)
        .form_target(TERM_P2);
    let options = ScrapeOptions {
        use_synonyms: false,
        ..ScrapeOptions::default()
    };
    let records = scout()
        .scrape(&mut surface, &ristoranti(), options)
        .await
        .expect("scrape");

    assert_eq!(records.len(), 2);
    let typed: Vec<&str> = surface.typed().iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(typed, vec!["ristoranti milano", "milano"]);
}

// ---------------------------------------------------------------------------
// launcher lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn launched_surface_is_released_after_a_failed_run() {
    let launcher = ReplayLauncher::new(&ReplaySurface::new());
    let mut surface = launcher.launch().await.expect("launch");

    let result = scout()
        .scrape(surface.as_mut(), &ristoranti(), ScrapeOptions::default())
        .await;
    surface.close().await.expect("close");

    assert!(result.is_err());
    assert_eq!(launcher.launched(), 1);
    assert_eq!(launcher.closed(), 1);
}
