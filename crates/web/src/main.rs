use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sixtakes_core::{
    Card, CardId, Column, ColumnId, Engine, ErrorKind, Event, EventBus, Game, GameError, GameId,
    GameStatus, MemoryStore, Placement, Player, PlayerId, RngState, Role,
};
use sixtakes_data::{load_game_config, populate};
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};
use tiny_http::{Header, Method, Response, Server, StatusCode};

fn main() {
    let server = Server::http("0.0.0.0:7878").expect("start server");
    println!("sixtakes web server on http://localhost:7878");
    let state = Arc::new(Mutex::new(AppState::new()));
    for request in server.incoming_requests() {
        let state = state.clone();
        if let Err(err) = handle_request(request, state) {
            eprintln!("request error: {err}");
        }
    }
}

struct AppState {
    engine: Engine<MemoryStore>,
    events: EventBus,
}

impl AppState {
    fn new() -> Self {
        let config = load_game_config(Path::new("config.json")).expect("load config");
        let mut store = MemoryStore::new();
        populate(&mut store, &config);
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0xC0FFEE);
        Self {
            engine: Engine::new(store, config, RngState::from_seed(seed)),
            events: EventBus::default(),
        }
    }
}

// ------------------------------------------------------------------ views

#[derive(Serialize)]
struct ApiCard {
    id: u32,
    number: u32,
    penalty: u32,
}

#[derive(Serialize)]
struct ApiPlayer {
    id: u32,
    name: String,
    role: Role,
}

#[derive(Serialize)]
struct ApiGame {
    id: u32,
    status: GameStatus,
    owner: u32,
    members: Vec<u32>,
    resolving_turn: bool,
    bots_have_chosen: bool,
}

#[derive(Serialize)]
struct ApiGameDetail {
    game: ApiGame,
    columns: Vec<ApiColumn>,
    results: Vec<ApiScore>,
}

#[derive(Serialize)]
struct ApiColumn {
    id: u32,
    cards: Vec<ApiCard>,
}

#[derive(Serialize)]
struct ApiSelection {
    player: u32,
    card: ApiCard,
}

#[derive(Serialize)]
struct ApiHand {
    player: u32,
    cards: Vec<ApiCard>,
}

#[derive(Serialize)]
struct ApiHeap {
    player: u32,
    value: u32,
    cards: Vec<ApiCard>,
}

#[derive(Serialize)]
struct ApiScore {
    player: u32,
    name: String,
    value: u32,
}

#[derive(Serialize)]
struct ApiStatus {
    player: ApiPlayer,
    has_chosen_card: bool,
    needs_to_choose_column: bool,
}

#[derive(Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
enum ApiPlacement {
    Placed {
        player: u32,
        card: u32,
        column: u32,
        swept: Vec<ApiCard>,
    },
    ColumnChoiceRequired {
        player: u32,
    },
}

#[derive(Serialize)]
struct Envelope {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    events: Vec<Event>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<serde_json::Value>,
}

fn api_card(card: &Card) -> ApiCard {
    ApiCard {
        id: card.id.0,
        number: card.number,
        penalty: card.penalty,
    }
}

fn api_player(player: &Player) -> ApiPlayer {
    ApiPlayer {
        id: player.id.0,
        name: player.name.clone(),
        role: player.role,
    }
}

fn api_game(game: &Game) -> ApiGame {
    ApiGame {
        id: game.id.0,
        status: game.status,
        owner: game.owner.0,
        members: game.members.iter().map(|member| member.0).collect(),
        resolving_turn: game.resolving_turn,
        bots_have_chosen: game.bots_have_chosen,
    }
}

fn api_column(column: &Column) -> ApiColumn {
    ApiColumn {
        id: column.id.0,
        cards: column.cards.iter().map(api_card).collect(),
    }
}

fn api_placement(placement: &Placement) -> ApiPlacement {
    match placement {
        Placement::Placed {
            player,
            card,
            column,
            swept,
        } => ApiPlacement::Placed {
            player: player.0,
            card: card.0,
            column: column.0,
            swept: swept.iter().map(api_card).collect(),
        },
        Placement::ColumnChoiceRequired { player } => ApiPlacement::ColumnChoiceRequired {
            player: player.0,
        },
    }
}

fn api_scores(engine: &Engine<MemoryStore>, game_id: GameId) -> Result<Vec<ApiScore>, GameError> {
    let results = engine.results(game_id)?;
    let mut scores = Vec::with_capacity(results.len());
    for (player_id, value) in results {
        let name = engine
            .player(player_id)
            .map(|player| player.name.clone())
            .unwrap_or_default();
        scores.push(ApiScore {
            player: player_id.0,
            name,
            value,
        });
    }
    Ok(scores)
}

// ---------------------------------------------------------------- request

#[derive(Deserialize)]
struct PlayerBody {
    player: u32,
}

#[derive(Deserialize)]
struct ChooseCardBody {
    player: u32,
    #[serde(default)]
    card_id: Option<u32>,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    #[serde(default)]
    role: Option<String>,
}

enum Reply {
    Data(serde_json::Value),
    Game(GameError),
    BadRequest(String),
    UnknownRoute,
}

fn reply<T: Serialize>(result: Result<T, GameError>) -> Reply {
    match result {
        Ok(value) => match serde_json::to_value(value) {
            Ok(json) => Reply::Data(json),
            Err(err) => Reply::BadRequest(err.to_string()),
        },
        Err(err) => Reply::Game(err),
    }
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, Reply> {
    serde_json::from_str(body).map_err(|err| Reply::BadRequest(format!("bad request body: {err}")))
}

fn parse_id(raw: &str) -> Result<u32, Reply> {
    raw.parse()
        .map_err(|_| Reply::BadRequest(format!("invalid id {raw:?}")))
}

fn query_param(query: Option<&str>, key: &str) -> Option<String> {
    let query = query?;
    query.split('&').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == key).then(|| value.to_string())
    })
}

fn player_param(query: Option<&str>) -> Result<PlayerId, Reply> {
    let raw = query_param(query, "player")
        .ok_or_else(|| Reply::BadRequest("missing player parameter".to_string()))?;
    Ok(PlayerId(parse_id(&raw)?))
}

fn handle_request(
    mut request: tiny_http::Request,
    state: Arc<Mutex<AppState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = request.url().to_string();
    let method = request.method().clone();
    let (path, query) = match url.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (url.as_str(), None),
    };
    let segments: Vec<&str> = path.split('/').filter(|segment| !segment.is_empty()).collect();
    let mut body = String::new();
    if matches!(method, Method::Post | Method::Put | Method::Delete) {
        request.as_reader().read_to_string(&mut body)?;
    }

    let mut guard = state.lock().unwrap();
    let app = &mut *guard;
    let outcome = route(app, &method, &segments, query, &body);
    let events: Vec<Event> = app.events.drain().collect();
    drop(guard);

    match outcome {
        Reply::Data(data) => respond_json(
            request,
            200,
            &Envelope {
                ok: true,
                error: None,
                events,
                data: Some(data),
            },
        ),
        Reply::Game(err) => {
            let status = match err.kind() {
                ErrorKind::NotFound => 404,
                ErrorKind::PreconditionFailed => 400,
            };
            respond_json(
                request,
                status,
                &Envelope {
                    ok: false,
                    error: Some(err.to_string()),
                    events,
                    data: None,
                },
            )
        }
        Reply::BadRequest(message) => respond_json(
            request,
            400,
            &Envelope {
                ok: false,
                error: Some(message),
                events,
                data: None,
            },
        ),
        Reply::UnknownRoute => {
            request.respond(Response::empty(StatusCode(404)))?;
            Ok(())
        }
    }
}

fn route(
    app: &mut AppState,
    method: &Method,
    segments: &[&str],
    query: Option<&str>,
    body: &str,
) -> Reply {
    match try_route(app, method, segments, query, body) {
        Ok(reply) => reply,
        Err(reply) => reply,
    }
}

fn try_route(
    app: &mut AppState,
    method: &Method,
    segments: &[&str],
    query: Option<&str>,
    body: &str,
) -> Result<Reply, Reply> {
    let engine = &mut app.engine;
    let events = &mut app.events;
    let response = match (method, segments) {
        (&Method::Get, ["api", "players"]) => {
            let players: Vec<ApiPlayer> = engine.players().into_iter().map(api_player).collect();
            reply(Ok(players))
        }
        (&Method::Post, ["api", "players"]) => {
            let body: RegisterBody = parse_body(body)?;
            let role = match body.role.as_deref() {
                None => Role::Human,
                Some(raw) => match Role::from_id(raw) {
                    Some(Role::Admin) | None => {
                        return Err(Reply::BadRequest(format!("invalid role {raw:?}")))
                    }
                    Some(role) => role,
                },
            };
            reply(
                engine
                    .register_player(&body.name, role)
                    .map(|id| api_player(engine.player(id).expect("registered player"))),
            )
        }
        (&Method::Get, ["api", "games"]) => {
            let games: Vec<ApiGame> = engine.games().into_iter().map(api_game).collect();
            reply(Ok(games))
        }
        (&Method::Post, ["api", "games"]) => {
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .create_game(PlayerId(body.player), events)
                    .and_then(|id| engine.game(id).map(api_game)),
            )
        }
        (&Method::Get, ["api", "games", id]) => {
            let game_id = GameId(parse_id(id)?);
            reply(game_detail(engine, game_id))
        }
        (&Method::Delete, ["api", "games", id]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(engine.delete_game(game_id, PlayerId(body.player), events))
        }
        (&Method::Post, ["api", "games", id, "enter"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .add_member(game_id, PlayerId(body.player), events)
                    .and_then(|_| engine.game(game_id).map(api_game)),
            )
        }
        (&Method::Post, ["api", "games", id, "leave"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .remove_member(game_id, PlayerId(body.player), events)
                    .and_then(|_| engine.game(game_id).map(api_game)),
            )
        }
        (&Method::Post, ["api", "games", id, "start"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .setup(game_id, PlayerId(body.player), events)
                    .and_then(|_| game_detail(engine, game_id)),
            )
        }
        (&Method::Get, ["api", "games", id, "bots"]) => {
            let game_id = GameId(parse_id(id)?);
            reply(
                engine
                    .available_bots(game_id)
                    .map(|bots| bots.into_iter().map(api_player).collect::<Vec<_>>()),
            )
        }
        (&Method::Post, ["api", "games", id, "bots", "choose"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(engine.fill_bot_selections(game_id, PlayerId(body.player), events))
        }
        (&Method::Post, ["api", "games", id, "bots", bot]) => {
            let game_id = GameId(parse_id(id)?);
            let bot_id = PlayerId(parse_id(bot)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .add_bot(game_id, bot_id, PlayerId(body.player), events)
                    .and_then(|_| engine.game(game_id).map(api_game)),
            )
        }
        (&Method::Post, ["api", "games", id, "card"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: ChooseCardBody = parse_body(body)?;
            let card_id = body.card_id.map(CardId);
            reply(
                engine
                    .choose_card(game_id, PlayerId(body.player), card_id, events)
                    .map(|card| api_card(&card)),
            )
        }
        (&Method::Post, ["api", "games", id, "place"]) => {
            let game_id = GameId(parse_id(id)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .place_next_card(game_id, PlayerId(body.player), events)
                    .map(|placement| api_placement(&placement)),
            )
        }
        (&Method::Post, ["api", "games", id, "columns", column, "choose"]) => {
            let game_id = GameId(parse_id(id)?);
            let column_id = ColumnId(parse_id(column)?);
            let body: PlayerBody = parse_body(body)?;
            reply(
                engine
                    .choose_column(game_id, PlayerId(body.player), column_id, events)
                    .map(|placement| api_placement(&placement)),
            )
        }
        (&Method::Get, ["api", "games", id, "columns"]) => {
            let game_id = GameId(parse_id(id)?);
            reply(
                engine
                    .columns(game_id)
                    .map(|columns| columns.into_iter().map(api_column).collect::<Vec<_>>()),
            )
        }
        (&Method::Get, ["api", "games", id, "selections"]) => {
            let game_id = GameId(parse_id(id)?);
            let player = player_param(query)?;
            reply(engine.visible_selections(game_id, player).map(|selections| {
                selections
                    .iter()
                    .map(|selection| ApiSelection {
                        player: selection.player.0,
                        card: api_card(&selection.card),
                    })
                    .collect::<Vec<_>>()
            }))
        }
        (&Method::Get, ["api", "games", id, "results"]) => {
            let game_id = GameId(parse_id(id)?);
            reply(api_scores(engine, game_id))
        }
        (&Method::Get, ["api", "games", id, "hand"]) => {
            let game_id = GameId(parse_id(id)?);
            let player = player_param(query)?;
            reply(engine.hand(game_id, player).map(|hand| ApiHand {
                player: hand.player.0,
                cards: hand.cards.iter().map(api_card).collect(),
            }))
        }
        (&Method::Get, ["api", "games", id, "players", player, "status"]) => {
            let game_id = GameId(parse_id(id)?);
            let player_id = PlayerId(parse_id(player)?);
            reply(engine.player_status(game_id, player_id).map(|status| ApiStatus {
                player: api_player(&status.player),
                has_chosen_card: status.has_chosen_card,
                needs_to_choose_column: status.needs_to_choose_column,
            }))
        }
        (&Method::Get, ["api", "games", id, "players", player, "heap"]) => {
            let game_id = GameId(parse_id(id)?);
            let player_id = PlayerId(parse_id(player)?);
            reply(engine.heap(game_id, player_id).map(|heap| ApiHeap {
                player: heap.player.0,
                value: heap.value(),
                cards: heap.cards.iter().map(api_card).collect(),
            }))
        }
        _ => Reply::UnknownRoute,
    };
    Ok(response)
}

fn game_detail(
    engine: &Engine<MemoryStore>,
    game_id: GameId,
) -> Result<ApiGameDetail, GameError> {
    let game = api_game(engine.game(game_id)?);
    let columns = engine
        .columns(game_id)?
        .into_iter()
        .map(api_column)
        .collect();
    let results = api_scores(engine, game_id)?;
    Ok(ApiGameDetail {
        game,
        columns,
        results,
    })
}

fn respond_json(
    request: tiny_http::Request,
    status: u16,
    body: &Envelope,
) -> Result<(), Box<dyn std::error::Error>> {
    let data = serde_json::to_vec_pretty(body)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| "content-type header")?;
    request.respond(
        Response::from_data(data)
            .with_status_code(StatusCode(status))
            .with_header(header),
    )?;
    Ok(())
}
