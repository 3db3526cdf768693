// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Command-line client for the key/value store service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use iii_iv_center::ServiceModel;
use iii_iv_example::KvClient;
use iii_iv_example::model::Key;
use std::env;
use std::process;

/// Prefix of the environment variables that configure the client.
const ENV_PREFIX: &str = "SERVICE_CENTER";

/// Syntax of the command line.
const USAGE: &str = "Usage: iii-iv-example list | get KEY | set KEY VALUE | delete KEY";

/// Runs the command given in `args` against `client`.
async fn run(client: &KvClient, args: &[String]) -> Result<(), String> {
    let args = args.iter().map(String::as_str).collect::<Vec<_>>();
    match args.as_slice() {
        ["list"] => {
            for key in client.keys().await.map_err(|e| e.to_string())? {
                println!("{}", key.as_str());
            }
        }
        ["get", key] => {
            let key = Key::new(*key).map_err(|e| e.to_string())?;
            match client.get_key(&key).await.map_err(|e| e.to_string())? {
                Some(entry) => println!("{}", entry.alternative()),
                None => return Err(format!("Key {} not found", key.as_str())),
            }
        }
        ["set", key, value] => {
            let key = Key::new(*key).map_err(|e| e.to_string())?;
            let value = (*value).to_owned();
            let entry = client.set_key(&key, value).await.map_err(|e| e.to_string())?;
            println!("{}", entry.alternative());
        }
        ["delete", key] => {
            let key = Key::new(*key).map_err(|e| e.to_string())?;
            client.delete_key(&key).await.map_err(|e| e.to_string())?;
        }
        _ => return Err(USAGE.to_owned()),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = env::args().skip(1).collect::<Vec<_>>();
    let client = match KvClient::from_env(ENV_PREFIX).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            process::exit(2);
        }
    };

    let result = run(&client, &args).await;
    for serviced in client.history() {
        log::info!("{} took {:?}", serviced.id(), serviced.duration());
    }
    if let Err(e) = result {
        eprintln!("{}", e);
        process::exit(1);
    }
}
