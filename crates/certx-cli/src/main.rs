//! certx
//!
//! Command-line client for a running certx node. Every command is a single
//! JSON-RPC call.
//!
//! Usage:
//!   certx issue   --user <id> --course <id> [--rpc <url>]
//!   certx show    <certificate_id>
//!   certx list    --user <id>
//!   certx verify  <certificate_id>
//!   certx mint    <certificate_id> --to <address>
//!   certx anchor  <certificate_id>
//!   certx revoke  <certificate_id>
//!   certx expire  <certificate_id>
//!   certx annotate <certificate_id> --key <k> --value <v>
//!   certx info

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::debug;

use certx_rpc::{RpcAnchor, RpcCertificate};

mod rpc_client;
use rpc_client::CertxRpcClient;

// ── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "certx", version, about = "certx — issue, anchor and verify course certificates")]
struct Args {
    /// Node RPC endpoint.
    #[arg(long, global = true, default_value = "http://127.0.0.1:8546")]
    rpc: String,

    /// Print raw JSON instead of a summary.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Issue the certificate for a learner and course (returns the existing one if already issued).
    Issue {
        #[arg(long)]
        user: String,
        #[arg(long)]
        course: String,
    },

    /// Show a certificate.
    Show { certificate_id: String },

    /// List a learner's certificates, newest first.
    List {
        #[arg(long)]
        user: String,
    },

    /// Run the public verification check.
    Verify { certificate_id: String },

    /// Mint the certificate on chain to a destination wallet.
    Mint {
        certificate_id: String,
        /// Destination wallet address.
        #[arg(long)]
        to: String,
    },

    /// Show the on-chain anchor of a certificate.
    Anchor { certificate_id: String },

    /// Revoke a certificate (terminal).
    Revoke { certificate_id: String },

    /// Mark a certificate expired (terminal).
    Expire { certificate_id: String },

    /// Attach a metadata entry to a certificate. Keys cannot be overwritten.
    Annotate {
        certificate_id: String,
        #[arg(long)]
        key: String,
        #[arg(long)]
        value: String,
    },

    /// Print node information.
    Info,
}

// ── Main ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn,certx_cli=info")
        .init();

    let args = Args::parse();
    let client = CertxRpcClient::new(&args.rpc);
    debug!(rpc = %args.rpc, command = ?args.command, "dispatching");

    match args.command {
        Command::Issue { user, course } => {
            let result = client.issue_certificate(&user, &course).await?;
            if args.json {
                return print_json(&result);
            }
            if result.created {
                println!("Issued new certificate.");
            } else {
                println!("Certificate already issued.");
            }
            print_certificate(&result.certificate);
            Ok(())
        }

        Command::Show { certificate_id } => match client.get_certificate(&certificate_id).await? {
            Some(cert) if args.json => print_json(&cert),
            Some(cert) => {
                print_certificate(&cert);
                Ok(())
            }
            None => bail!("certificate {certificate_id} not found"),
        },

        Command::List { user } => {
            let certs = client.list_certificates(&user).await?;
            if args.json {
                return print_json(&certs);
            }
            if certs.is_empty() {
                println!("No certificates for {user}.");
            }
            for cert in &certs {
                println!(
                    "{}  {:<8}  {}  {}",
                    cert.certificate_id,
                    cert.status,
                    format_ts(cert.issue_date),
                    cert.course_name
                );
            }
            Ok(())
        }

        Command::Verify { certificate_id } => {
            let result = client.verify(&certificate_id).await?;
            if args.json {
                return print_json(&result);
            }
            println!("Verified:   {}", if result.verified { "yes" } else { "NO" });
            println!("Message:    {}", result.message);
            if let Some(status) = result.status {
                println!("Status:     {status}");
            }
            if let Some(cert) = &result.certificate {
                println!("Student:    {}", cert.student_name);
                println!("Course:     {}", cert.course_name);
                println!("Completed:  {}", format_ts(cert.completion_date));
                println!("Issued:     {}", format_ts(cert.issue_date));
                if let Some(exp) = cert.expires_at {
                    println!("Expires:    {}", format_ts(exp));
                }
            }
            if let Some(anchor) = &result.anchor {
                println!("Anchor tx:  {}", anchor.tx_hash);
                println!("Digest ok:  {}", anchor.digest_matches);
                match anchor.chain_corroborated {
                    Some(ok) => println!("On chain:   {ok}"),
                    None => println!("On chain:   not checked"),
                }
            }
            Ok(())
        }

        Command::Mint { certificate_id, to } => {
            let result = client.mint_anchor(&certificate_id, &to).await?;
            if args.json {
                return print_json(&result);
            }
            if result.minted {
                println!("Minted.");
            } else {
                println!("Already minted.");
            }
            print_anchor(&result.anchor);
            Ok(())
        }

        Command::Anchor { certificate_id } => match client.get_anchor(&certificate_id).await? {
            Some(anchor) if args.json => print_json(&anchor),
            Some(anchor) => {
                print_anchor(&anchor);
                Ok(())
            }
            None => bail!("certificate {certificate_id} has no anchor"),
        },

        Command::Revoke { certificate_id } => {
            let cert = client.set_status(&certificate_id, "revoked").await?;
            println!("Certificate {} is now {}.", cert.certificate_id, cert.status);
            Ok(())
        }

        Command::Expire { certificate_id } => {
            let cert = client.set_status(&certificate_id, "expired").await?;
            println!("Certificate {} is now {}.", cert.certificate_id, cert.status);
            Ok(())
        }

        Command::Annotate { certificate_id, key, value } => {
            let cert = client.annotate(&certificate_id, &key, &value).await?;
            if args.json {
                return print_json(&cert);
            }
            print_certificate(&cert);
            Ok(())
        }

        Command::Info => {
            let info = client.service_info().await?;
            if args.json {
                return print_json(&info);
            }
            println!("Version:        {}", info.version);
            println!("Certificates:   {}", info.certificate_count);
            println!("Anchors:        {}", info.anchor_count);
            match info.validity_secs {
                Some(secs) => println!("Validity:       {} days", secs / 86_400),
                None => println!("Validity:       unlimited"),
            }
            println!("Ledger timeout: {} ms", info.ledger_timeout_ms);
            println!("Mint timeout:   {} ms", info.mint_timeout_ms);
            println!("Anchor image:   {}", info.anchor_image_uri);
            println!("Explorer:       {}", if info.chain_explorer { "enabled" } else { "disabled" });
            Ok(())
        }
    }
}

// ── Output helpers ────────────────────────────────────────────────────────────

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_certificate(cert: &RpcCertificate) {
    println!("Certificate: {}", cert.certificate_id);
    println!("Status:      {}", cert.status);
    println!("Student:     {} ({})", cert.student_name, cert.user_id);
    println!("Course:      {} ({})", cert.course_name, cert.course_id);
    if let Some(level) = &cert.course_level {
        println!("Level:       {level}");
    }
    println!("Completed:   {}", format_ts(cert.completion_date));
    println!("Issued:      {}", format_ts(cert.issue_date));
    if let Some(exp) = cert.expires_at {
        println!("Expires:     {}", format_ts(exp));
    }
    println!("Digest:      {}", cert.content_digest);
    for (key, value) in &cert.metadata {
        println!("  {key} = {value}");
    }
}

fn print_anchor(anchor: &RpcAnchor) {
    println!("Certificate: {}", anchor.certificate_id);
    println!("Policy:      {}", anchor.policy_id);
    println!("Asset:       {} ({})", anchor.asset_id, anchor.asset_name);
    println!("Tx hash:     {}", anchor.tx_hash);
    println!("Owner:       {}", anchor.destination_address);
    println!("Minted:      {}", format_ts(anchor.minted_at));
}

/// Unix seconds as an RFC 3339 UTC string; raw seconds if out of range.
fn format_ts(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}
