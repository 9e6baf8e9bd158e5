use std::path::PathBuf;
use std::sync::RwLock;

use actix_cors::Cors;
use actix_web::{get, put, web, App, HttpResponse, HttpServer, Responder};

use clap::Parser;
use log::{info, warn};
use serde::Deserialize;
use rs_chain_core::io::{join_words, read_words, split_words};
use rs_chain_core::{ChainError, ChainModel, Generator, StartSeed};

/// Command line configuration of the server
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP front-end for a word-level Markov chain")]
struct Args {
	/// Address to bind to
	#[arg(long, default_value = "127.0.0.1")]
	host: String,

	/// Port to listen on
	#[arg(long, default_value_t = 5000)]
	port: u16,

	/// Order of the initial model
	#[arg(long, default_value_t = 2)]
	order: usize,

	/// Corpus file to train the initial model on
	#[arg(long)]
	corpus: Option<PathBuf>,

	/// Largest `length` accepted by `/v1/generate`
	#[arg(long, default_value_t = 10_000)]
	max_length: usize,
}

/// Struct representing query parameters for the `/v1/generate` endpoint
#[derive(Deserialize)]
struct GenerateParams {
	length: Option<usize>,
	sentences: Option<bool>,
	seed: Option<String> // -> random or custom:<words>
}

#[derive(Deserialize)]
struct ResetQuery {
	order: Option<usize>
}

/// Request limits, fixed at startup.
struct Limits {
	max_length: usize
}

/// Model shared by every worker.
///
/// Training and reset take the write lock, generation and stats the read lock.
struct SharedData {
	model: ChainModel
}

impl GenerateParams {
	/// Determines the starting seed strategy for the walk.
	fn start_seed(&self) -> Result<StartSeed<String>, String> {
		match &self.seed {
			None => Ok(StartSeed::Random),
			Some(s) if s.to_lowercase() == "random" => Ok(StartSeed::Random),
			Some(s) if s.to_lowercase().starts_with("custom:") => {
				let words = split_words(&s["custom:".len()..]);
				if words.is_empty() {
					Err("Custom seed cannot be empty".into())
				} else {
					Ok(StartSeed::Custom(words))
				}
			}
			Some(_) => Err("Seed must be 'random' or start with 'custom:'".into()),
		}
	}
}

/// Maps a model error to an HTTP response.
fn error_response(error: ChainError) -> HttpResponse {
	match error {
		ChainError::InvalidOrder(_) | ChainError::InvalidContext { .. } => {
			HttpResponse::BadRequest().body(error.to_string())
		}
		ChainError::EmptyModel { .. } | ChainError::NoSentenceStart { .. } | ChainError::NoSequenceStart { .. } => {
			HttpResponse::Conflict().body(error.to_string())
		}
		ChainError::OrderMismatch { .. } => HttpResponse::InternalServerError().body(error.to_string()),
	}
}

/// HTTP GET endpoint `/v1/generate`
///
/// Walks the shared model based on query parameters.
/// Returns the generated words, space separated, as the response body.
#[get("/v1/generate")]
async fn get_generated(
	data: web::Data<RwLock<SharedData>>,
	limits: web::Data<Limits>,
	query: web::Query<GenerateParams>,
) -> impl Responder {
	let length = query.length.unwrap_or(30);
	let sentences = query.sentences.unwrap_or(false);

	// Checked before locking, a long walk would hold the read lock
	if length > limits.max_length {
		return HttpResponse::BadRequest().body(format!("length must be <= {}", limits.max_length));
	}

	let start_seed = match query.start_seed() {
		Ok(s) => s,
		Err(e) => return HttpResponse::BadRequest().body(e)
	};

	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let mut generator = Generator::new(&shared_data.model);
	let result = if sentences {
		if start_seed != StartSeed::Random {
			return HttpResponse::BadRequest().body("Sentence generation picks its own seed");
		}
		generator.generate_sentences(length)
	} else {
		generator.generate_with(&start_seed, length)
	};

	match result {
		Ok(words) => HttpResponse::Ok().body(join_words(&words)),
		Err(e) => error_response(e),
	}
}

/// HTTP PUT endpoint `/v1/train`
///
/// Tokenizes the plain text body and adds it to the shared model.
#[put("/v1/train")]
async fn put_train(data: web::Data<RwLock<SharedData>>, body: String) -> impl Responder {
	let tokens = split_words(&body);

	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	match shared_data.model.train_parallel(&tokens) {
		Ok(_) => {
			info!("trained on {} tokens, {} contexts", tokens.len(), shared_data.model.len());
			HttpResponse::Ok().body(format!("Trained on {} tokens", tokens.len()))
		}
		Err(e) => error_response(e),
	}
}

/// HTTP PUT endpoint `/v1/reset`
///
/// Replaces the shared model with an empty one, optionally of another order.
#[put("/v1/reset")]
async fn put_reset(data: web::Data<RwLock<SharedData>>, query: web::Query<ResetQuery>) -> impl Responder {
	let mut shared_data = match data.write() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};

	let order = query.order.unwrap_or(shared_data.model.order());
	match ChainModel::new(order) {
		Ok(model) => {
			shared_data.model = model;
			HttpResponse::Ok().body(format!("Model reset with order {order}"))
		}
		Err(e) => error_response(e),
	}
}

#[get("/v1/stats")]
async fn get_stats(data: web::Data<RwLock<SharedData>>) -> impl Responder {
	let shared_data = match data.read() {
		Ok(m) => m,
		Err(_) => return HttpResponse::InternalServerError().body("Model lock failed"),
	};
	HttpResponse::Ok().body(format!(
		"order: {}\ncontexts: {}",
		shared_data.model.order(),
		shared_data.model.len()
	))
}

/// Builds the initial model from the command line.
fn initial_model(args: &Args) -> Result<ChainModel, Box<dyn std::error::Error>> {
	let mut model = ChainModel::new(args.order)?;
	if let Some(path) = &args.corpus {
		let tokens = read_words(path)?;
		model.train_parallel(&tokens)?;
		info!("loaded {} ({} tokens, {} contexts)", path.display(), tokens.len(), model.len());
	} else {
		warn!("no corpus given, the model stays empty until PUT /v1/train");
	}
	Ok(model)
}

/// Main entry point for the server.
///
/// Builds the model, wraps it in a `RwLock` shared by all workers,
/// and starts an Actix-web HTTP server.
#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	env_logger::init();
	let args = Args::parse();

	let shared_data = SharedData {
		model: initial_model(&args)?,
	};
	let shared_model = web::Data::new(RwLock::new(shared_data));
	let limits = web::Data::new(Limits { max_length: args.max_length });

	info!("listening on {}:{}", args.host, args.port);
	HttpServer::new(move || {
		App::new()
			.wrap(Cors::default().allow_any_origin().allowed_methods(vec!["GET", "PUT"]))
			.app_data(shared_model.clone())
			.app_data(limits.clone())
			.service(get_generated)
			.service(put_train)
			.service(put_reset)
			.service(get_stats)
	})
		.bind((args.host.as_str(), args.port))?
		.run()
		.await?;

	Ok(())
}
