//! Simple demo - a schema with static, dynamic and released fields
//!
//! This example demonstrates:
//! - Static and dynamic producers registered in a context
//! - A field with a default value
//! - A producer that depends on another field and registers a release step
//! - Reverse-order teardown when the scope ends
//!
//! Run with `cargo run --example simple`

use almond_di::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Connection opened from the configured address
struct Connection {
    addr: String,
    id: u32,
}

struct Address(String);

fn main() -> Result<(), DiError> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let next_id = Arc::new(AtomicU32::new(1));

    let mut context = Context::new();
    context
        .with_static(12i32)
        .with_dynamic(rand_flag)
        .with_static(Address("127.0.0.1:5432".to_string()))
        .provide::<Connection, _>(
            FnProducer::builder::<Connection>()
                .depends_on::<Address>()
                .build_with_release(move |deps| {
                    let addr = deps.get::<Address>()?;
                    let conn = Connection {
                        addr: addr.0.clone(),
                        id: next_id.fetch_add(1, Ordering::SeqCst),
                    };
                    println!("opened connection #{} to {}", conn.id, conn.addr);
                    let id = conn.id;
                    Ok((conn, move || println!("closed connection #{}", id)))
                }),
        );

    let compiled = Schema::new("WhatIsUp")
        .field::<Connection>("conn")
        .field::<i32>("want_this")
        .field::<bool>("and_this")
        .field::<Address>("addr")
        .field_with_default("retries", 3u8)
        .compile(&context)?;

    println!("build order: {:?}", compiled.field_order());

    for _ in 0..2 {
        compiled.with_scope(|what| {
            let conn = what.get::<Connection>("conn")?;
            println!(
                "want_this={} and_this={} retries={} conn=#{}",
                what.get::<i32>("want_this")?,
                what.get::<bool>("and_this")?,
                what.get::<u8>("retries")?,
                conn.id
            );
            Ok::<_, DiError>(())
        })?;
    }

    Ok(())
}

fn rand_flag() -> bool {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() % 2 == 0)
        .unwrap_or(false)
}
