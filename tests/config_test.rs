use anyhow::Result;
use latchpool::{BufferFactory, PoolConfig, StatsSnapshot, StringFactory};

#[test]
fn test_config_from_json() -> Result<()> {
    let config: PoolConfig = serde_json::from_str(
        r#"{ "initial_capacity": 256, "max_retained_capacity": 4096, "max_idle": 2 }"#,
    )?;
    assert_eq!(config.initial_capacity, 256);
    assert_eq!(config.max_retained_capacity, Some(4096));
    assert_eq!(config.max_idle, Some(2));

    let factory = BufferFactory::with_config(config);
    assert!(factory.get().cap() >= 256);
    Ok(())
}

#[test]
fn test_missing_fields_use_defaults() -> Result<()> {
    let config: PoolConfig = serde_json::from_str(r#"{ "initial_capacity": 8 }"#)?;
    assert_eq!(config, PoolConfig::sized(8));

    let empty: PoolConfig = serde_json::from_str("{}")?;
    assert_eq!(empty, PoolConfig::default());
    Ok(())
}

#[test]
fn test_max_idle_bounds_pool() -> Result<()> {
    let config: PoolConfig = serde_json::from_str(r#"{ "max_idle": 1 }"#)?;
    let factory = StringFactory::with_config(config);

    let mut a = factory.get();
    let mut b = factory.get();
    factory.put(&mut a)?;
    factory.put(&mut b)?;

    assert_eq!(factory.idle(), 1);
    assert_eq!(factory.stats().discarded, 1);
    Ok(())
}

#[test]
fn test_stats_serialize() -> Result<()> {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    factory.put(&mut buf)?;
    let _ = factory.put(&mut buf);

    let json = serde_json::to_value(factory.stats())?;
    assert_eq!(json["acquired"], 1);
    assert_eq!(json["returned"], 1);
    assert_eq!(json["rejected"], 1);

    let back: StatsSnapshot = serde_json::from_value(json)?;
    assert_eq!(back, factory.stats());
    Ok(())
}

#[test]
fn test_pool_error_converts_for_anyhow() -> Result<()> {
    let factory = BufferFactory::new();
    let mut buf = factory.get();
    factory.put(&mut buf)?;

    let err = anyhow::Error::from(factory.put(&mut buf).unwrap_err());
    assert_eq!(err.to_string(), "buffer already returned");
    assert!(err.downcast_ref::<latchpool::PoolError>().is_some_and(latchpool::PoolError::is_returned));
    Ok(())
}
