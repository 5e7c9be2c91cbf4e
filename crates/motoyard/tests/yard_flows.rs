//! End-to-end operator and mechanic flows against the `SQLite` store.

use chrono::Utc;
use serde_json::{json, Value};

use motoyard::beacon::{associate, disassociate, set_beacon};
use motoyard::error::MSG_NOT_FOUND;
use motoyard::status::{update_status, StatusChange};
use motoyard::{
    resolve_by_plate, yard, Config, Error, KeyValueStore, SqliteStore, VehicleRecord,
};

fn setup() -> (SqliteStore, Config) {
    let store = SqliteStore::open_in_memory().expect("in-memory store");
    (store, Config::default())
}

async fn stored(store: &SqliteStore, key: &str) -> Value {
    serde_json::from_str(&store.get(key).await.unwrap().unwrap()).unwrap()
}

#[tokio::test]
async fn plate_lookup_associate_and_research() {
    let (store, config) = setup();
    let keys = config.keys.candidates();
    store
        .set("dadosMoto", r#"{"placa":"ABC1234","codigoBeacon":""}"#)
        .await
        .unwrap();

    let found = resolve_by_plate(&store, &keys, "abc 1234").await.unwrap();
    assert_eq!(found.record.plate, "ABC1234");

    associate(&store, &keys, "abc 1234", "XYZ99").await.unwrap();

    let again = resolve_by_plate(&store, &keys, "abc 1234").await.unwrap();
    assert_eq!(again.record.beacon_code(), Some("XYZ99"));
    assert_eq!(
        store.get("dadosMoto").await.unwrap().unwrap(),
        r#"{"placa":"ABC1234","codigoBeacon":"XYZ99"}"#
    );
}

#[tokio::test]
async fn empty_storage_reports_access_denied() {
    let (store, config) = setup();
    let keys = config.keys.candidates();

    assert!(resolve_by_plate(&store, &keys, "ABC1234").await.is_none());

    let err = associate(&store, &keys, "ABC1234", "B1").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.user_message(), MSG_NOT_FOUND);
}

#[tokio::test]
async fn maintenance_without_diagnostic_writes_nothing() {
    let (store, config) = setup();
    let keys = config.keys.candidates();
    let raw = r#"[{"placa":"ABC1234","statusOperacional":"Disponível"}]"#;
    store.set("motos", raw).await.unwrap();

    let change = StatusChange::new("Em manutenção", Some(String::new()));
    let err = update_status(
        &store,
        &keys,
        "ABC1234",
        &change,
        &config.status.maintenance_keywords,
        Utc::now(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(store.get("motos").await.unwrap().unwrap(), raw);
}

#[tokio::test]
async fn full_lifecycle() {
    let (store, config) = setup();
    let keys = config.keys.candidates();

    let mut bike = VehicleRecord::new("bra 2e19");
    bike.model = Some("Mottu Sport".to_string());
    bike.operational_status = Some("Disponível".to_string());
    yard::register(&store, &config.keys, bike).await.unwrap();

    let mut other = VehicleRecord::new("QWE9876");
    other.model = Some("Honda Pop".to_string());
    yard::register(&store, &config.keys, other).await.unwrap();

    // The single-vehicle key now holds QWE9876, so BRA2E19 comes from the list
    let resolved = resolve_by_plate(&store, &keys, "BRA2E19").await.unwrap();
    assert_eq!(resolved.key, "motos");
    assert_eq!(resolved.index, 0);

    associate(&store, &keys, "BRA2E19", "BCN-001").await.unwrap();

    let change = StatusChange::new("Em manutenção", Some("corrente".to_string()));
    update_status(
        &store,
        &keys,
        "bra2e19",
        &change,
        &config.status.maintenance_keywords,
        Utc::now(),
    )
    .await
    .unwrap();

    let list = stored(&store, "motos").await;
    assert_eq!(list[0]["codigoBeacon"], "BCN-001");
    assert_eq!(list[0]["statusOperacional"], "Em manutenção");
    assert_eq!(list[0]["diagnostico"], "corrente");
    assert!(list[0]["ultimaAtualizacao"].is_string());
    assert_eq!(list[1]["placa"], "QWE9876");
    assert!(list[1].get("ultimaAtualizacao").is_none());

    disassociate(&store, &keys, "BRA2E19").await.unwrap();
    let err = disassociate(&store, &keys, "BRA2E19").await.unwrap_err();
    assert!(matches!(err, Error::NoBeaconAssociated { .. }));

    yard::remove(&store, &keys, "BRA2E19").await.unwrap();
    assert!(resolve_by_plate(&store, &keys, "BRA2E19").await.is_none());
    assert_eq!(stored(&store, "motos").await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn legacy_key_and_marker_are_honoured() {
    let (store, config) = setup();
    let keys = config.keys.candidates();
    store
        .set(
            "listaMotos",
            &json!([{"placa": "OLD1A23", "beaconId": "LEG-5", "vaga": "B7"}]).to_string(),
        )
        .await
        .unwrap();

    let resolved = resolve_by_plate(&store, &keys, "old1a23").await.unwrap();
    assert_eq!(resolved.key, "listaMotos");
    assert!(resolved.record.has_beacon());
    assert_eq!(resolved.record.beacon_code(), Some("LEG-5"));

    set_beacon(&store, &resolved, Some("LEG-5")).await.unwrap();

    let after = stored(&store, "listaMotos").await;
    assert_eq!(
        after,
        json!([{"placa": "OLD1A23", "codigoBeacon": "LEG-5", "vaga": "B7"}])
    );
}

#[tokio::test]
async fn corrupt_key_does_not_hide_later_keys() {
    let (store, config) = setup();
    let keys = config.keys.candidates();
    store.set("dadosMoto", "not json at all").await.unwrap();
    store
        .set("motos", r#"[{"placa":"ABC1234"}]"#)
        .await
        .unwrap();

    let resolved = resolve_by_plate(&store, &keys, "ABC1234").await.unwrap();
    assert_eq!(resolved.key, "motos");
}
