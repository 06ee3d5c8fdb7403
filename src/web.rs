use actix_web::{middleware, web, App, HttpResponse, HttpServer, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use crate::display::{render, Layout};
use crate::error::RosterError;
use crate::parser::parse_students;
use crate::roster::{fire_roster, house_overview, location_choices, search_students, Day};
use crate::schedule::{Catalog, SlotKind};
use crate::state::Roster;
use crate::store::{backup_file_name, export_backup, restore_backup, Store};

/// Shared state for the local web surface. One user, one roster.
pub struct AppState {
    pub roster: Mutex<Roster>,
    pub catalog: Catalog,
    pub store: Store,
    /// Seeded from `--seed` when given, so web runs repeat like CLI runs
    pub rng: Mutex<StdRng>,
}

impl AppState {
    pub fn new(roster: Roster, catalog: Catalog, store: Store, rng: StdRng) -> Self {
        AppState { roster: Mutex::new(roster), catalog, store, rng: Mutex::new(rng) }
    }

    fn roster(&self) -> Result<MutexGuard<'_, Roster>> {
        self.roster
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("roster lock poisoned"))
    }

    fn rng(&self) -> Result<MutexGuard<'_, StdRng>> {
        self.rng
            .lock()
            .map_err(|_| actix_web::error::ErrorInternalServerError("rng lock poisoned"))
    }
}

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    search: String,
    #[serde(default)]
    all: bool,
}

fn failure(err: RosterError) -> HttpResponse {
    let body = serde_json::json!({"success": false, "error": err.to_string()});
    match err {
        RosterError::UnknownStudent(_) | RosterError::UnknownSlot { .. } => HttpResponse::NotFound().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn parse_kind(kind: &str) -> std::result::Result<SlotKind, HttpResponse> {
    kind.parse().map_err(failure)
}

/// Saves the snapshot and answers with the current roster
fn saved(state: &AppState, roster: &Roster) -> HttpResponse {
    state.store.save(roster);
    HttpResponse::Ok().json(roster)
}

async fn get_state(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = state.roster()?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "roster": &*roster,
        "catalog": &state.catalog,
    })))
}

async fn list_students(query: web::Query<SearchQuery>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = state.roster()?;
    let found = search_students(&roster.students, &query.search, query.all);
    Ok(HttpResponse::Ok().json(found))
}

async fn houses(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = state.roster()?;
    Ok(HttpResponse::Ok().json(house_overview(&roster.students)))
}

async fn fire(day: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let day: Day = match day.parse() {
        Ok(d) => d,
        Err(e) => return Ok(failure(e)),
    };
    let roster = state.roster()?;
    Ok(HttpResponse::Ok().json(fire_roster(&roster.students, day)))
}

async fn import(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    let content = String::from_utf8_lossy(&body);
    match parse_students(&content, Utc::now().timestamp_millis()) {
        Ok(students) => {
            let mut roster = state.roster()?;
            roster.import_students(students);
            Ok(saved(&state, &roster))
        }
        Err(e) => Ok(failure(e)),
    }
}

async fn distribute(kind: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return Ok(resp),
    };
    let mut roster = state.roster()?;
    let mut rng = state.rng()?;
    roster.distribute(&state.catalog, kind, &mut *rng);
    Ok(saved(&state, &roster))
}

async fn toggle_lock(path: web::Path<(String, String)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (kind, slot) = path.into_inner();
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return Ok(resp),
    };
    let mut roster = state.roster()?;
    match roster.toggle_lock(&state.catalog, kind, &slot) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn add_student(path: web::Path<(String, String, String)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (kind, slot, student) = path.into_inner();
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return Ok(resp),
    };
    let mut roster = state.roster()?;
    match roster.add_to_slot(&state.catalog, kind, &slot, &student) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn remove_student(path: web::Path<(String, String, String)>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (kind, slot, student) = path.into_inner();
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return Ok(resp),
    };
    let mut roster = state.roster()?;
    match roster.remove_from_slot(&state.catalog, kind, &slot, &student) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn toggle_presence(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut roster = state.roster()?;
    match roster.toggle_presence(&id) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn toggle_kitchen(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut roster = state.roster()?;
    match roster.toggle_kitchen_duty(&id) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn toggle_marked(id: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut roster = state.roster()?;
    match roster.toggle_marked(&id) {
        Ok(_) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn location_options(
    id: web::Path<String>,
    query: web::Query<SearchQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse> {
    let roster = state.roster()?;
    let student = match roster.student(&id) {
        Ok(s) => s,
        Err(e) => return Ok(failure(e)),
    };
    let choices = location_choices(&roster.students, student, &query.search);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "ownRoom": choices.own_room,
        "houseRooms": choices.house_rooms,
        "commonAreas": choices.common_areas,
        "allRooms": choices.all_rooms.iter().map(|r| r.label()).collect::<Vec<_>>(),
    })))
}

async fn set_location(path: web::Path<(String, String)>, body: String, state: web::Data<AppState>) -> Result<HttpResponse> {
    let (id, day) = path.into_inner();
    let day: Day = match day.parse() {
        Ok(d) => d,
        Err(e) => return Ok(failure(e)),
    };
    let mut roster = state.roster()?;
    match roster.set_sleeping_location(&id, day, &body) {
        Ok(()) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn set_week(week: web::Path<u32>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut roster = state.roster()?;
    roster.set_weekend_num(week.into_inner());
    Ok(saved(&state, &roster))
}

async fn backup(state: web::Data<AppState>) -> Result<HttpResponse> {
    let roster = state.roster()?;
    match export_backup(&roster) {
        Ok(blob) => Ok(HttpResponse::Ok()
            .content_type("application/json")
            .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", backup_file_name(&roster))))
            .body(blob)),
        Err(e) => Ok(failure(e)),
    }
}

async fn restore(body: web::Bytes, state: web::Data<AppState>) -> Result<HttpResponse> {
    let blob = String::from_utf8_lossy(&body);
    let mut roster = state.roster()?;
    match restore_backup(&mut roster, &blob) {
        Ok(()) => Ok(saved(&state, &roster)),
        Err(e) => Ok(failure(e)),
    }
}

async fn print(layout: web::Path<String>, state: web::Data<AppState>) -> Result<HttpResponse> {
    let layout: Layout = match layout.parse() {
        Ok(l) => l,
        Err(e) => return Ok(failure(e)),
    };
    let roster = state.roster()?;
    let report = render(layout, &roster, &state.catalog);
    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(report))
}

/// Registers every API route
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/state", web::get().to(get_state))
        .route("/api/students", web::get().to(list_students))
        .route("/api/houses", web::get().to(houses))
        .route("/api/fire/{day}", web::get().to(fire))
        .route("/api/import", web::post().to(import))
        .route("/api/distribute/{kind}", web::post().to(distribute))
        .route("/api/slots/{kind}/{slot}/lock", web::post().to(toggle_lock))
        .service(
            web::resource("/api/slots/{kind}/{slot}/students/{id}")
                .route(web::post().to(add_student))
                .route(web::delete().to(remove_student)),
        )
        .route("/api/students/{id}/presence", web::post().to(toggle_presence))
        .route("/api/students/{id}/kitchen", web::post().to(toggle_kitchen))
        .route("/api/students/{id}/mark", web::post().to(toggle_marked))
        .route("/api/students/{id}/locations", web::get().to(location_options))
        .route("/api/students/{id}/location/{day}", web::put().to(set_location))
        .route("/api/week/{week}", web::put().to(set_week))
        .route("/api/backup", web::get().to(backup))
        .route("/api/restore", web::post().to(restore))
        .route("/api/print/{layout}", web::get().to(print));
}

pub async fn start_server(port: u16, state: AppState) -> std::io::Result<()> {
    let app_state = web::Data::new(state);
    info!(port, "serving roster on localhost");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(("127.0.0.1", port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use rand::SeedableRng;

    fn app_state(name: &str) -> web::Data<AppState> {
        seeded_state(name, 0)
    }

    fn seeded_state(name: &str, seed: u64) -> web::Data<AppState> {
        let path = std::env::temp_dir().join(format!("weekend-web-{}-{}.json", name, std::process::id()));
        web::Data::new(AppState::new(Roster::default(), Catalog::default(), Store::new(path), StdRng::seed_from_u64(seed)))
    }

    const SHEET: &str = "Fornavn,Efternavn,Værelse,Hus,Weekend\nAnna,Berg,1,Nord,ja\nBo,Holm,2,Syd,ja\n";

    #[actix_web::test]
    async fn import_then_distribute_and_print() {
        let state = app_state("flow");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/import").set_payload(SHEET).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post().uri("/api/distribute/task").to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let assigned: usize = roster["taskAssignments"]
            .as_object()
            .unwrap()
            .values()
            .map(|v| v.as_array().unwrap().len())
            .sum();
        assert_eq!(assigned, 2);

        let req = test::TestRequest::get().uri("/api/print/duties").to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert!(String::from_utf8_lossy(&body).contains("Duties - Friday"));

        let _ = state.store.reset();
    }

    #[actix_web::test]
    async fn bad_requests_are_reported() {
        let state = app_state("errors");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/import").set_payload("nothing useful").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/distribute/laundry").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/students/nobody/presence").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post().uri("/api/restore").set_payload("{broken").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    const BIG_SHEET: &str = "Fornavn,Hus,Værelse,Weekend\n\
                             A,Nord,1,ja\nB,Nord,2,ja\nC,Nord,3,ja\nD,Syd,1,ja\n\
                             E,Syd,2,ja\nF,Syd,3,ja\nG,Syd,4,ja\nH,Syd,5,ja\n";

    async fn seeded_task_assignments(name: &str) -> serde_json::Value {
        let state = seeded_state(name, 99);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/import").set_payload(BIG_SHEET).to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        // ids carry the import time, so compare by first name
        let names: std::collections::HashMap<String, String> = roster["students"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| (s["id"].as_str().unwrap().to_string(), s["firstName"].as_str().unwrap().to_string()))
            .collect();

        let req = test::TestRequest::post().uri("/api/distribute/task").to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let _ = state.store.reset();

        let mut by_name = serde_json::Map::new();
        for (slot, ids) in roster["taskAssignments"].as_object().unwrap() {
            let people: Vec<String> = ids.as_array().unwrap().iter().map(|id| names[id.as_str().unwrap()].clone()).collect();
            by_name.insert(slot.clone(), serde_json::json!(people));
        }
        serde_json::Value::Object(by_name)
    }

    #[actix_web::test]
    async fn same_seed_gives_same_web_distribution() {
        let first = seeded_task_assignments("seed-a").await;
        let second = seeded_task_assignments("seed-b").await;
        assert_eq!(first, second);
        assert_eq!(first["f1"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn mark_and_blank_location() {
        let state = app_state("mark");
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = test::TestRequest::post().uri("/api/import").set_payload(SHEET).to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        let id = roster["students"][0]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post().uri(&format!("/api/students/{}/mark", id)).to_request();
        let roster: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(roster["students"][0]["isMarked"], true);

        let req = test::TestRequest::put()
            .uri(&format!("/api/students/{}/location/fredag", id))
            .set_payload("   ")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri("/api/students/nobody/mark").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let _ = state.store.reset();
    }
}
