//! Benchmark for seeding message values from a default table.
//!
//! Reads a JSON schema (or uses a built-in one), builds a default table from
//! borrowed literals, then times decoding-style message construction where
//! most fields keep their default and a few are overwritten.

use std::fs;
use std::time::Instant;

use rfast::{
    ByteVectorValueStorage, DecimalValueStorage, FieldKind, IntValueStorage, OwnedValue,
    StringValueStorage, Template, TemplateRegistry, Trailing, ValueMut, ValueStorage,
};
use serde::Deserialize;

// =============================================================================
// JSON SCHEMA
// =============================================================================

#[derive(Debug, Deserialize)]
struct Schema {
    template: TemplateDef,
    #[serde(default = "default_messages")]
    messages: u32,
    /// Percentage of fields overwritten per message.
    #[serde(default = "default_update_percent")]
    update_percent: u64,
}

#[derive(Debug, Deserialize)]
struct TemplateDef {
    id: u32,
    name: String,
    fields: Vec<FieldDef>,
}

#[derive(Debug, Deserialize)]
struct FieldDef {
    name: String,
    kind: KindDef,
    default: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindDef {
    Int32,
    UInt32,
    Int64,
    UInt64,
    Decimal,
    Ascii,
    Unicode,
    ByteVector,
}

impl KindDef {
    fn field_kind(self) -> FieldKind {
        match self {
            KindDef::Int32 => FieldKind::Int32,
            KindDef::UInt32 => FieldKind::UInt32,
            KindDef::Int64 => FieldKind::Int64,
            KindDef::UInt64 => FieldKind::UInt64,
            KindDef::Decimal => FieldKind::Decimal,
            KindDef::Ascii => FieldKind::Ascii,
            KindDef::Unicode => FieldKind::Unicode,
            KindDef::ByteVector => FieldKind::ByteVector,
        }
    }
}

fn default_messages() -> u32 {
    200_000
}

fn default_update_percent() -> u64 {
    10
}

const BUILTIN_SCHEMA: &str = r#"{
    "template": {
        "id": 48,
        "name": "MDIncRefresh",
        "fields": [
            { "name": "MsgSeqNum", "kind": "uint32" },
            { "name": "SendingTime", "kind": "uint64" },
            { "name": "MDUpdateAction", "kind": "uint32", "default": 0 },
            { "name": "MDEntryType", "kind": "ascii", "default": "0" },
            { "name": "SecurityExchange", "kind": "ascii", "default": "XNAS" },
            { "name": "MDEntryPx", "kind": "decimal", "default": "100.25" },
            { "name": "MDEntrySize", "kind": "int64", "default": 100 },
            { "name": "NumberOfOrders", "kind": "int32", "default": 1 },
            { "name": "Text", "kind": "unicode", "default": "" },
            { "name": "RawData", "kind": "bytevector" }
        ]
    },
    "messages": 200000,
    "update_percent": 10
}"#;

// =============================================================================
// DEFAULT TABLE
// =============================================================================

fn leak_str(s: &str) -> &'static str {
    Box::leak(s.to_owned().into_boxed_str())
}

/// Builds the default literal for one field. Content is leaked so the table
/// can be aliased for the rest of the run.
fn default_literal(field: &FieldDef) -> ValueStorage {
    let kind = field.kind.field_kind();
    let Some(value) = &field.default else {
        return kind.default_storage();
    };
    let int = || {
        value
            .as_i64()
            .unwrap_or_else(|| panic!("default for {} must be an integer", field.name))
    };
    let text = || {
        value
            .as_str()
            .map(leak_str)
            .unwrap_or_else(|| panic!("default for {} must be a string", field.name))
    };
    match field.kind {
        KindDef::Int32 => IntValueStorage::new(int() as i32).storage(),
        KindDef::UInt32 => IntValueStorage::new(int() as u32).storage(),
        KindDef::Int64 => IntValueStorage::new(int()).storage(),
        KindDef::UInt64 => IntValueStorage::new(int() as u64).storage(),
        KindDef::Decimal => {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            text.parse::<DecimalValueStorage>()
                .unwrap_or_else(|e| panic!("default for {}: {}", field.name, e))
                .storage()
        }
        KindDef::Ascii | KindDef::Unicode => StringValueStorage::new(text()).storage(),
        KindDef::ByteVector => ByteVectorValueStorage::new(text().as_bytes()).storage(),
    }
}

// =============================================================================
// WORKLOAD
// =============================================================================

/// Deterministic xorshift generator so runs are comparable.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
}

const VENUES: [&str; 4] = ["XNAS", "XNYS", "ARCX", "BATS"];

fn write_random(mut value: ValueMut<'_>, rng: &mut XorShift) {
    let r = rng.next();
    let result = match value.kind() {
        FieldKind::Int32 => value.set_int(r as i32),
        FieldKind::UInt32 => value.set_int(r as u32),
        FieldKind::Int64 => value.set_int(r as i64),
        FieldKind::UInt64 => value.set_int(r),
        FieldKind::Decimal => value.set_decimal((r % 1_000_000) as i64, -2),
        FieldKind::Ascii => value.assign_str(VENUES[(r % VENUES.len() as u64) as usize]),
        FieldKind::Unicode => value.assign_str("Ordre annulé"),
        FieldKind::ByteVector => value.assign_bytes(&r.to_le_bytes()),
        _ => Ok(()),
    };
    result.expect("Failed to write field");
}

fn fingerprint(values: &[OwnedValue]) -> u64 {
    values
        .iter()
        .map(|v| v.storage().as_raw().to_bytes()[0] as u64)
        .sum()
}

#[derive(Debug, Clone, Copy)]
struct MessageHeader {
    template_id: u32,
}

fn main() {
    let schema_json = match std::env::args().nth(1) {
        Some(path) => {
            println!("Loading schema from: {}", path);
            fs::read_to_string(&path).expect("Failed to read schema file")
        }
        None => {
            println!("Using built-in schema");
            BUILTIN_SCHEMA.to_string()
        }
    };
    let schema: Schema = serde_json::from_str(&schema_json).expect("Failed to parse schema");

    let kinds: Vec<FieldKind> = schema
        .template
        .fields
        .iter()
        .map(|f| f.kind.field_kind())
        .collect();

    let mut registry = TemplateRegistry::new();
    let template = registry
        .register(Template::new(
            schema.template.id,
            schema.template.name.as_str(),
            kinds.clone(),
        ))
        .expect("Failed to register template");

    let defaults: Vec<ValueStorage> = schema.template.fields.iter().map(default_literal).collect();

    println!("\n=== Default Table ===");
    println!("Template: {} (id {})", template.name(), template.id());
    for (field, (kind, default)) in schema.template.fields.iter().zip(kinds.iter().zip(&defaults)) {
        // SAFETY: literals borrow leaked 'static content.
        let value = unsafe { OwnedValue::from_default(kind.clone(), default) };
        let view = value.view();
        let shown = match kind {
            FieldKind::Decimal => view.decimal().ok().flatten().map(|d| d.to_string()),
            FieldKind::Ascii | FieldKind::Unicode => {
                view.as_str().ok().flatten().map(|s| format!("{:?}", s))
            }
            FieldKind::ByteVector => view.bytes().ok().flatten().map(|b| format!("{:?}", b)),
            _ => view.int::<i64>().ok().flatten().map(|i| i.to_string()),
        };
        println!(
            "  {:<18} {:<12} {}",
            field.name,
            kind.name(),
            shown.unwrap_or_else(|| "<absent>".to_string())
        );
    }

    let messages = schema.messages;
    let update_percent = schema.update_percent.min(100);
    println!(
        "\nMessages: {}, fields per message: {}, update rate: {}%",
        messages,
        kinds.len(),
        update_percent
    );

    // Flat copy of the default table into trailing storage
    let trailing_start = Instant::now();
    let mut present = 0usize;
    for _ in 0..messages {
        let msg = Trailing::with_values(
            MessageHeader {
                template_id: template.id(),
            },
            &defaults,
        );
        assert_eq!(msg.header().template_id, template.id());
        present += msg.values().iter().filter(|v| v.is_present()).count();
    }
    let trailing_time = trailing_start.elapsed();

    println!("\nTrailing copy: {:?}", trailing_time);
    println!(
        "  Per message: {:.1} ns",
        trailing_time.as_nanos() as f64 / messages as f64
    );
    println!("  Present fields seen: {}", present);

    // Owned values seeded from defaults, a fraction overwritten
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);
    let mut written = 0usize;
    let mut checksum = 0u64;

    let owned_start = Instant::now();
    for _ in 0..messages {
        let mut values: Vec<OwnedValue> = kinds
            .iter()
            .zip(&defaults)
            // SAFETY: literals borrow leaked 'static content.
            .map(|(kind, default)| unsafe { OwnedValue::from_default(kind.clone(), default) })
            .collect();
        for value in &mut values {
            if rng.next() % 100 < update_percent {
                write_random(value.view_mut(), &mut rng);
                written += 1;
            }
        }
        checksum = checksum.wrapping_add(fingerprint(&values));
    }
    let owned_time = owned_start.elapsed();

    println!("\nOwned seed + update: {:?}", owned_time);
    println!(
        "  Per message: {:.1} ns",
        owned_time.as_nanos() as f64 / messages as f64
    );
    println!("  Fields written: {}", written);
    println!("  Checksum: {}", checksum);

    // Deep clone of a fully written message
    let mut sample: Vec<OwnedValue> = kinds.iter().cloned().map(OwnedValue::new).collect();
    for value in &mut sample {
        write_random(value.view_mut(), &mut rng);
    }

    const CLONE_ITERS: u32 = 10_000;
    let clone_start = Instant::now();
    for _ in 0..CLONE_ITERS {
        let copy = sample.clone();
        assert_eq!(copy.len(), sample.len());
    }
    let clone_time = clone_start.elapsed() / CLONE_ITERS;

    println!(
        "\nDeep clone: {:?} (avg of {} iterations)",
        clone_time, CLONE_ITERS
    );

    println!("\n=== Summary ===");
    println!("Value size: {} bytes", std::mem::size_of::<ValueStorage>());
    println!(
        "Default table: {} bytes",
        defaults.len() * std::mem::size_of::<ValueStorage>()
    );
    println!(
        "Owned vs trailing: {:.1}x",
        owned_time.as_secs_f64() / trailing_time.as_secs_f64()
    );
}
