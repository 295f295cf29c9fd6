#!/usr/bin/env cargo
//! Spray campaign database seeder
//!
//! Logs in to a running API and fills it with a small, plausible campaign:
//! provinces with their districts, localities and communities, actor types
//! and field actors, a yearly spray configuration and a few weeks of daily
//! spray records.
//!
//! Usage:
//!   `cargo run --bin seed_database -- --url http://localhost:3000 --username admin --password secret`

use chrono::{Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use clap::{Arg, Command};
use console::style;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use rand::Rng;
use reqwest::Client;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::Duration;

type SeedResult<T> = Result<T, Box<dyn std::error::Error>>;

const WALL_TYPES: &[&str] = &["MATOPE", "BLOCO", "CANICO", "MADEIRA", "ZINCO"];
const ROOF_TYPES: &[&str] = &["CAPIM", "ZINCO", "LUSALITE", "TELHA"];
const REASONS: &[&str] = &["RECUSA", "FECHADA", "DOENTE", "FUNERAL"];
const INSECTICIDES: &[&str] = &["Actellic 300CS", "Fludora Fusion", "SumiShield 50WG"];

/// Province -> district -> locality -> communities
const GEOGRAPHY: &[(&str, &str, &[(&str, &[(&str, &[&str])])])] = &[
    (
        "Gaza",
        "GZ",
        &[
            (
                "Chokwe",
                &[
                    ("Lionde", &["Lionde Sede", "Conhane", "Munhamane"]),
                    ("Macarretane", &["Macarretane A", "Chiduachine"]),
                ],
            ),
            ("Guija", &[("Mubangoene", &["Mubangoene Sede", "Chivonguene"])]),
        ],
    ),
    (
        "Tete",
        "TT",
        &[
            ("Moatize", &[("Benga", &["Benga Sede", "Capanga"])]),
            ("Angonia", &[("Ulongue", &["Ulongue Sede", "Domue"])]),
        ],
    ),
    (
        "Zambezia",
        "ZB",
        &[("Mocuba", &[("Munhiba", &["Munhiba Sede", "Mugeba", "Namagoa"])])],
    ),
];

#[derive(Debug, Clone)]
pub struct SeedingConfig {
    pub base_url: String,
    pub token: String,
    pub client: Client,
}

#[derive(Debug, Default)]
pub struct CreatedObjects {
    pub provinces: Vec<Value>,
    pub districts: Vec<Value>,
    pub localities: Vec<Value>,
    pub communities: Vec<Value>,
    pub actor_types: Vec<Value>,
    pub sprayers: Vec<Value>,
    pub brigade_chiefs: Vec<Value>,
    pub configurations: Vec<Value>,
    pub spray_totals: Vec<Value>,
}

pub struct DatabaseSeeder {
    config: SeedingConfig,
    created_objects: CreatedObjects,
    year: i32,
    days: i64,
}

fn progress_bar(len: usize) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(bar_style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} {msg}")
    {
        pb.set_style(bar_style.progress_chars("##-"));
    }
    pb
}

fn id_of(value: &Value) -> SeedResult<String> {
    value["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("response without an id: {value}").into())
}

fn pick<'a>(rng: &mut impl Rng, items: &'a [&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

/// One day of work in one community
fn random_spray_total(
    rng: &mut impl Rng,
    community_id: &str,
    sprayer_id: &str,
    brigade_chief_id: &str,
    configuration_id: &str,
    spray_date: NaiveDate,
    completed: bool,
) -> Value {
    let found = rng.random_range(20..=90);
    let sprayed = rng.random_range(found * 6 / 10..=found);
    let population = found * rng.random_range(3..=6);

    json!({
        "community_id": community_id,
        "sprayer_id": sprayer_id,
        "brigade_chief_id": brigade_chief_id,
        "spray_configuration_id": configuration_id,
        "spray_type": if rng.random_bool(0.85) { "PRINCIPAL" } else { "SECUNDARIA" },
        "spray_date": spray_date,
        "spray_status": if completed { "COMPLETED" } else { "IN_PROGRESS" },
        "insecticide": pick(rng, INSECTICIDES),
        "structures_found": found,
        "structures_sprayed": sprayed,
        "compartments_sprayed": sprayed * rng.random_range(2..=4),
        "wall_type": pick(rng, WALL_TYPES),
        "roof_type": pick(rng, ROOF_TYPES),
        "total_population": population,
        "children_under_5": population / 6,
        "pregnant_women": population / 25,
        "reason_not_sprayed": if sprayed < found { Some(pick(rng, REASONS)) } else { None },
    })
}

impl DatabaseSeeder {
    pub fn new(base_url: &str, year: i32, days: i64) -> SeedResult<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            config: SeedingConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                token: String::new(),
                client,
            },
            created_objects: CreatedObjects::default(),
            year,
            days,
        })
    }

    pub async fn login(&mut self, username: &str, password: &str) -> SeedResult<()> {
        let response = self
            .config
            .client
            .post(format!("{}/api/auth/login", self.config.base_url))
            .json(&json!({"username": username, "password": password}))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!("Login failed with HTTP {status}: {error_text}").into());
        }

        let body = response.json::<Value>().await?;
        self.config.token = body["token"]
            .as_str()
            .ok_or("login response without a token")?
            .to_string();
        println!(
            "{} Logged in as {} ({})",
            style("ok").green(),
            style(username).bold(),
            body["user"]["role"].as_str().unwrap_or("unknown role")
        );
        Ok(())
    }

    async fn post(&self, endpoint: &str, data: Value) -> SeedResult<Value> {
        let response = self
            .config
            .client
            .post(format!("{}{}", self.config.base_url, endpoint))
            .bearer_auth(&self.config.token)
            .json(&data)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<Value>().await?)
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(format!("HTTP {status} {endpoint}: {error_text}").into())
        }
    }

    /// Posts many bodies to one endpoint with bounded concurrency
    async fn post_parallel(
        &self,
        endpoint: &str,
        bodies: Vec<Value>,
        max_concurrent: usize,
        pb: &ProgressBar,
    ) -> Result<Vec<Value>, String> {
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let mut tasks = Vec::new();

        for body in bodies {
            let sem = Arc::clone(&semaphore);
            let config = self.config.clone();
            let url = format!("{}{}", config.base_url, endpoint);
            let pb_clone = pb.clone();

            tasks.push(tokio::spawn(async move {
                let _permit = sem.acquire().await.map_err(|e| e.to_string())?;

                let result = match config
                    .client
                    .post(&url)
                    .bearer_auth(&config.token)
                    .json(&body)
                    .send()
                    .await
                {
                    Ok(resp) if resp.status().is_success() => resp
                        .json::<Value>()
                        .await
                        .map_err(|e| format!("JSON parse error: {e}")),
                    Ok(resp) => {
                        let status = resp.status();
                        let error_text = resp.text().await.unwrap_or_default();
                        Err(format!("HTTP {status} {url}: {error_text}"))
                    }
                    Err(e) => Err(format!("Request error {url}: {e}")),
                };

                pb_clone.inc(1);
                result
            }));
        }

        join_all(tasks)
            .await
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("Task join error: {e}"))?
            .into_iter()
            .collect()
    }

    pub async fn create_geography(&mut self) -> SeedResult<()> {
        println!("{} Creating geography...", style("[1/4]").bold().dim());

        let community_count: usize = GEOGRAPHY
            .iter()
            .flat_map(|(_, _, districts)| districts.iter())
            .flat_map(|(_, localities)| localities.iter())
            .map(|(_, communities)| communities.len())
            .sum();
        let pb = progress_bar(community_count);

        for (province_name, province_code, districts) in GEOGRAPHY {
            let province = self
                .post("/api/provinces", json!({"name": province_name, "code": province_code}))
                .await?;
            let province_id = id_of(&province)?;
            self.created_objects.provinces.push(province);

            for (district_name, localities) in *districts {
                let district = self
                    .post(
                        "/api/districts",
                        json!({"name": district_name, "province_id": province_id}),
                    )
                    .await?;
                let district_id = id_of(&district)?;
                self.created_objects.districts.push(district);

                for (locality_name, communities) in *localities {
                    let locality = self
                        .post(
                            "/api/localities",
                            json!({"name": locality_name, "district_id": district_id}),
                        )
                        .await?;
                    let locality_id = id_of(&locality)?;
                    self.created_objects.localities.push(locality);

                    for community_name in *communities {
                        pb.set_message(format!("Creating: {community_name}"));
                        let community = self
                            .post(
                                "/api/communities",
                                json!({"name": community_name, "locality_id": locality_id}),
                            )
                            .await?;
                        self.created_objects.communities.push(community);
                        pb.inc(1);
                    }
                }
            }
        }

        pb.finish_with_message("Geography created!");
        println!(
            "{} Created {} provinces, {} districts, {} localities and {} communities",
            style("ok").green(),
            self.created_objects.provinces.len(),
            self.created_objects.districts.len(),
            self.created_objects.localities.len(),
            self.created_objects.communities.len()
        );
        Ok(())
    }

    pub async fn create_actors(&mut self) -> SeedResult<()> {
        println!("{} Creating field teams...", style("[2/4]").bold().dim());

        let sprayer_type = self
            .post(
                "/api/actor-types",
                json!({"name": "Sprayer", "description": "Applies insecticide inside structures"}),
            )
            .await?;
        let chief_type = self
            .post(
                "/api/actor-types",
                json!({"name": "Brigade chief", "description": "Leads and supervises a spray brigade"}),
            )
            .await?;
        let sprayer_type_id = id_of(&sprayer_type)?;
        let chief_type_id = id_of(&chief_type)?;
        self.created_objects.actor_types.push(sprayer_type);
        self.created_objects.actor_types.push(chief_type);

        let teams = self.created_objects.communities.len().div_ceil(2);
        let pb = progress_bar(teams * 3);

        for team in 1..=teams {
            pb.set_message(format!("Brigade {team}"));
            let chief = self
                .post(
                    "/api/actors",
                    json!({
                        "name": format!("Chefe de Brigada {team:02}"),
                        "number": format!("CB-{team:03}"),
                        "is_active": true,
                        "actor_type_id": chief_type_id,
                    }),
                )
                .await?;
            self.created_objects.brigade_chiefs.push(chief);
            pb.inc(1);

            for member in 1..=2 {
                let sprayer = self
                    .post(
                        "/api/actors",
                        json!({
                            "name": format!("Pulverizador {team:02}-{member}"),
                            "number": format!("PL-{team:03}-{member}"),
                            "is_active": true,
                            "actor_type_id": sprayer_type_id,
                        }),
                    )
                    .await?;
                self.created_objects.sprayers.push(sprayer);
                pb.inc(1);
            }
        }

        pb.finish_with_message("Field teams created!");
        println!(
            "{} Created {} brigade chiefs and {} sprayers",
            style("ok").green(),
            self.created_objects.brigade_chiefs.len(),
            self.created_objects.sprayers.len()
        );
        Ok(())
    }

    pub async fn create_configurations(&mut self) -> SeedResult<()> {
        println!("{} Creating spray configurations...", style("[3/4]").bold().dim());

        let national = self
            .post(
                "/api/spray-configurations",
                json!({
                    "year": self.year,
                    "spray_target": 12_000,
                    "proposed_spray_days": 40,
                    "spray_rounds": 1,
                    "days_between_rounds": 0,
                    "is_active": true,
                    "description": format!("Campanha nacional {}", self.year),
                }),
            )
            .await?;
        self.created_objects.configurations.push(national);

        for province in &self.created_objects.provinces.clone() {
            let configuration = self
                .post(
                    "/api/spray-configurations",
                    json!({
                        "year": self.year,
                        "province_id": id_of(province)?,
                        "spray_target": 4_000,
                        "proposed_spray_days": 40,
                        "spray_rounds": 1,
                        "days_between_rounds": 0,
                        "is_active": true,
                        "description": format!(
                            "Campanha {} {}",
                            province["name"].as_str().unwrap_or_default(),
                            self.year
                        ),
                    }),
                )
                .await?;
            self.created_objects.configurations.push(configuration);
        }

        println!(
            "{} Created {} configurations for {}",
            style("ok").green(),
            self.created_objects.configurations.len(),
            self.year
        );
        Ok(())
    }

    pub async fn create_spray_totals(&mut self) -> SeedResult<()> {
        println!("{} Recording daily spray totals...", style("[4/4]").bold().dim());

        let start = NaiveDate::from_ymd_opt(self.year, 10, 1).ok_or("invalid campaign year")?;
        let today = Utc::now().date_naive();
        let configuration_id = id_of(
            self.created_objects
                .configurations
                .first()
                .ok_or("no configuration created")?,
        )?;

        let mut bodies = Vec::new();
        {
            let mut rng = rand::rng();
            for day in 0..self.days {
                let spray_date = start + ChronoDuration::days(day);
                for (index, community) in self.created_objects.communities.iter().enumerate() {
                    // Not every community is visited every day
                    if !rng.random_bool(0.6) {
                        continue;
                    }
                    let team = index / 2;
                    let sprayer = &self.created_objects.sprayers[(team * 2 + day as usize % 2)
                        % self.created_objects.sprayers.len()];
                    let chief = &self.created_objects.brigade_chiefs
                        [team % self.created_objects.brigade_chiefs.len()];
                    bodies.push(random_spray_total(
                        &mut rng,
                        &id_of(community)?,
                        &id_of(sprayer)?,
                        &id_of(chief)?,
                        &configuration_id,
                        spray_date,
                        spray_date < today,
                    ));
                }
            }
        }

        let pb = progress_bar(bodies.len());
        pb.set_message("Posting records");
        let created = self.post_parallel("/api/spray-totals", bodies, 8, &pb).await?;
        self.created_objects.spray_totals = created;

        pb.finish_with_message("Spray totals recorded!");
        println!(
            "{} Created {} spray records over {} days",
            style("ok").green(),
            self.created_objects.spray_totals.len(),
            self.days
        );
        Ok(())
    }

    pub async fn seed_database(&mut self) -> SeedResult<()> {
        println!();
        println!("{}", style("Spray Campaign Seeder").bold().blue());
        println!("{}", style("Creating a sample campaign...").dim());
        println!();

        self.create_geography().await?;
        self.create_actors().await?;
        self.create_configurations().await?;
        self.create_spray_totals().await?;

        self.display_summary();
        Ok(())
    }

    fn display_summary(&self) {
        println!();
        println!("{}", style("Database Seeding Complete!").bold().green());
        println!("{}", style("=".repeat(50)).dim());

        let summary_data = [
            ("Provinces", self.created_objects.provinces.len()),
            ("Districts", self.created_objects.districts.len()),
            ("Localities", self.created_objects.localities.len()),
            ("Communities", self.created_objects.communities.len()),
            ("Actor types", self.created_objects.actor_types.len()),
            ("Sprayers", self.created_objects.sprayers.len()),
            ("Brigade chiefs", self.created_objects.brigade_chiefs.len()),
            ("Configurations", self.created_objects.configurations.len()),
            ("Spray totals", self.created_objects.spray_totals.len()),
        ];

        for (name, count) in summary_data {
            println!("{:.<20} {}", style(name).cyan(), style(count).bold().green());
        }

        println!();
        println!(
            "  {} Open {}/api/docs to explore the API",
            style("-").dim(),
            self.config.base_url
        );
        println!(
            "  {} Check {}/api/dashboard?year={}",
            style("-").dim(),
            self.config.base_url,
            self.year
        );
        println!();
    }
}

#[tokio::main]
async fn main() -> SeedResult<()> {
    let matches = Command::new("Spray Campaign Seeder")
        .version("1.0")
        .about("Seeds the spray campaign API with a sample geography, field teams and spray records")
        .arg(
            Arg::new("url")
                .short('u')
                .long("url")
                .value_name("URL")
                .help("API base URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("username")
                .long("username")
                .value_name("USERNAME")
                .help("Administrator username")
                .default_value("admin"),
        )
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .value_name("PASSWORD")
                .help("Administrator password")
                .required(true),
        )
        .arg(
            Arg::new("year")
                .short('y')
                .long("year")
                .value_name("YEAR")
                .help("Campaign year")
                .value_parser(clap::value_parser!(i32)),
        )
        .arg(
            Arg::new("days")
                .short('d')
                .long("days")
                .value_name("DAYS")
                .help("Number of spray days to generate")
                .default_value("14")
                .value_parser(clap::value_parser!(i64).range(1..=120)),
        )
        .get_matches();

    let base_url = matches
        .get_one::<String>("url")
        .cloned()
        .unwrap_or_default();
    let username = matches
        .get_one::<String>("username")
        .cloned()
        .unwrap_or_default();
    let password = matches
        .get_one::<String>("password")
        .cloned()
        .unwrap_or_default();
    let year = matches
        .get_one::<i32>("year")
        .copied()
        .unwrap_or_else(|| Utc::now().year());
    let days = matches.get_one::<i64>("days").copied().unwrap_or(14);

    println!("{}", style("Spray Campaign Seeder v1.0").bold());
    println!("{}", style("-".repeat(40)).dim());
    println!("API URL: {}", style(&base_url).cyan());
    println!("Year:    {}", style(year).cyan());

    let mut seeder = DatabaseSeeder::new(&base_url, year, days)?;
    seeder.login(&username, &password).await?;
    seeder.seed_database().await?;

    Ok(())
}
