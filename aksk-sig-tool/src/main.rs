use std::error::Error;
use std::io::{self, Write};
use std::time::Duration;

use aksk_sig::mock_request::MockRequest;
use aksk_sig::{
    CanonicalizeExt, Clock, Credentials, FixedClock, Interceptor, SignatureHeaders,
    SigningConfig, SimpleKeyProvider, SystemClock, VerifyingConfig, VerifyingExt,
};
use anyhow::anyhow;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
enum Mode {
    /// Print the string covered by the signature of an already signed request.
    StringToSign,
    /// Attach signature headers to the request and print it.
    Sign,
    /// Check the signature headers on the request.
    Verify,
}

#[derive(Debug, StructOpt)]
#[structopt(about = "Signs and verifies HTTP requests with access key / secret key headers.")]
struct Opt {
    #[structopt(subcommand)]
    mode: Mode,

    /// The access key.
    #[structopt(short, long, global = true, env = "AKSK_ACCESS_KEY")]
    access_key: Option<String>,

    /// The secret key.
    #[structopt(short, long, global = true, env = "AKSK_SECRET_KEY", hide_env_values = true)]
    secret_key: Option<String>,

    /// Unix time in seconds to sign or verify at, instead of the system clock.
    #[structopt(short, long, global = true)]
    now: Option<i64>,

    /// Width of a time bucket in seconds.
    #[structopt(short, long, global = true, default_value = "60")]
    bucket_width: u64,

    /// Number of buckets before the current one still accepted when verifying.
    #[structopt(short, long, global = true, default_value = "1")]
    previous_buckets: u32,
}

impl Opt {
    fn now(&self) -> i64 {
        self.now.unwrap_or_else(|| SystemClock.now())
    }
    fn credentials(&self) -> Credentials {
        Credentials::new(
            self.access_key.clone().unwrap_or_default(),
            self.secret_key.clone().unwrap_or_default(),
        )
    }
    fn signing_config(&self) -> SigningConfig {
        SigningConfig::default().with_bucket_width(Duration::from_secs(self.bucket_width))
    }
    fn verification_config(&self) -> Result<VerifyingConfig, Box<dyn Error>> {
        let mut key_provider = SimpleKeyProvider::default();

        match (self.access_key.as_deref(), self.secret_key.as_deref()) {
            (Some(access_key), Some(secret_key)) if !secret_key.is_empty() => {
                key_provider.add(access_key, secret_key);
            }
            _ => return Err(anyhow!("Both an access key and a secret key are required").into()),
        }

        Ok(VerifyingConfig::new(key_provider)
            .with_bucket_width(Duration::from_secs(self.bucket_width))
            .with_previous_buckets(self.previous_buckets))
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let opt = Opt::from_args();

    let req = MockRequest::from_reader(&mut io::stdin().lock())?;

    log::info!("{:?}", req);

    match opt.mode {
        Mode::StringToSign => {
            let res = req.canonicalize(&SignatureHeaders::default())?;
            io::stdout().lock().write_all(res.as_bytes())?;
        }
        Mode::Sign => {
            let interceptor =
                Interceptor::new(opt.signing_config()).with_clock(FixedClock(opt.now()));
            let req = interceptor
                .before_send(req, &opt.credentials())
                .ok_or_else(|| anyhow!("Request was not signed"))?;
            req.write(&mut io::stdout().lock())?;
        }
        Mode::Verify => {
            let verified = req.verify_at(&opt.verification_config()?, opt.now())?;
            log::info!(
                "Verified request from {} at {}",
                verified.access_key(),
                verified.timestamp()
            );
        }
    }

    Ok(())
}
