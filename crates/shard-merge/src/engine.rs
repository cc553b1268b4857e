//! The merge engine: renumbers each shard past the merged store's
//! high-water mark and appends it.

use std::fs;
use std::path::Path;

use shard_core::errors::{codes, ErrorInfo, ShardError};
use shard_core::sha256_file;
use shard_store::{encode, AccessMode, Container, ElementType, Namespace};
use tracing::{debug, info, warn};

use crate::config::MergeConfig;
use crate::counters::{read_counters, write_counters, Offset, META_DATASET};
use crate::discovery::discover_shards;
use crate::key::{EventKey, EventKind};
use crate::report::{
    MergeReport, SeedSummary, ShardOutcome, SkipReason, SkippedKey, REPORT_SCHEMA,
};
use crate::seed::seed_store;

/// Merges one shard into the store at `store_path`.
///
/// The counter record is read before anything is written and rewritten only
/// after every trace and cloud of the shard has been copied. Both handles are
/// closed before returning, so the next shard reads a committed mark.
pub fn merge_shard<C: Container>(
    store_path: &Path,
    shard_path: &Path,
) -> Result<ShardOutcome, ShardError> {
    let mut store = C::open(store_path, AccessMode::ReadWrite)?;
    let shard = C::open(shard_path, AccessMode::ReadOnly)?;

    let before = read_counters(&store)?;
    let offset = Offset::after(&before);
    let mut outcome = ShardOutcome::new(shard_path, offset, before.high_water_mark);

    copy_traces(&shard, &mut store, offset, &mut outcome)?;
    copy_clouds(&shard, &mut store, offset, &mut outcome)?;

    let after = before.advance(outcome.max_cloud_index);
    write_counters(&mut store, &after)?;
    outcome.high_water_after = after.high_water_mark;

    if let Some(max_trace) = outcome.max_trace_index {
        if max_trace as i64 > after.high_water_mark {
            warn!(
                shard = %shard_path.display(),
                max_trace,
                high_water = after.high_water_mark,
                "trace indices run past the high-water mark; later shards may collide"
            );
        }
    }

    shard.close()?;
    store.close()?;
    Ok(outcome)
}

fn skip(outcome: &mut ShardOutcome, namespace: Namespace, key: &str, reason: SkipReason) {
    warn!(
        shard = %outcome.shard.display(),
        dataset = %format!("{namespace}/{key}"),
        reason = ?reason,
        "skipping dataset"
    );
    outcome.skipped.push(SkippedKey {
        namespace,
        key: key.to_string(),
        reason,
    });
}

fn copy_traces<C: Container>(
    shard: &C,
    store: &mut C,
    offset: Offset,
    outcome: &mut ShardOutcome,
) -> Result<(), ShardError> {
    for name in shard.dataset_names(Namespace::Get)? {
        let key = match EventKey::parse(&name) {
            Ok(key) => key,
            Err(err) => {
                skip(outcome, Namespace::Get, &name, SkipReason::MalformedKey(err));
                continue;
            }
        };
        match key.kind {
            EventKind::Data => {}
            // Headers are rebuilt from the raw trace.
            EventKind::Header => continue,
            EventKind::Cloud => {
                skip(outcome, Namespace::Get, &name, SkipReason::UnexpectedKind);
                continue;
            }
        }
        let raw = shard.read_dataset(Namespace::Get, &name)?;
        if raw.is_empty() {
            skip(outcome, Namespace::Get, &name, SkipReason::EmptyTrace);
            continue;
        }
        let global = offset.apply(key.index)?;
        let header = encode(&raw, ElementType::Float64).with_first_scalar(global as f64)?;
        let data = encode(&raw, ElementType::Int16);
        let target = EventKey::new(global, EventKind::Header);
        store.create_dataset(Namespace::Get, &target.render(), &header)?;
        store.create_dataset(
            Namespace::Get,
            &target.with_kind(EventKind::Data).render(),
            &data,
        )?;
        debug!(from = %name, to = global, "copied trace");
        outcome.traces_copied += 1;
        outcome.max_trace_index = outcome.max_trace_index.max(Some(global));
    }
    Ok(())
}

fn copy_clouds<C: Container>(
    shard: &C,
    store: &mut C,
    offset: Offset,
    outcome: &mut ShardOutcome,
) -> Result<(), ShardError> {
    for name in shard.dataset_names(Namespace::Clouds)? {
        let key = match EventKey::parse(&name) {
            Ok(key) if key.kind == EventKind::Cloud => key,
            Ok(_) => {
                skip(outcome, Namespace::Clouds, &name, SkipReason::UnexpectedKind);
                continue;
            }
            Err(err) => {
                skip(outcome, Namespace::Clouds, &name, SkipReason::MalformedKey(err));
                continue;
            }
        };
        let global = offset.apply(key.index)?;
        let cloud = encode(
            &shard.read_dataset(Namespace::Clouds, &name)?,
            ElementType::Float64,
        );
        store.create_dataset(
            Namespace::Clouds,
            &EventKey::new(global, EventKind::Cloud).render(),
            &cloud,
        )?;
        debug!(from = %name, to = global, "copied cloud");
        outcome.clouds_copied += 1;
        outcome.max_cloud_index = outcome.max_cloud_index.max(Some(global));
    }
    Ok(())
}

fn summarize_seed<C: Container>(seed: &Path, work: &Path) -> Result<SeedSummary, ShardError> {
    let store = C::open(work, AccessMode::ReadOnly)?;
    let high_water_mark = if store.contains(Namespace::Meta, META_DATASET)? {
        Some(read_counters(&store)?.high_water_mark)
    } else {
        None
    };
    let count = |namespace: Namespace, kind: EventKind| -> Result<usize, ShardError> {
        Ok(store
            .dataset_names(namespace)?
            .iter()
            .filter(|name| EventKey::parse(name).is_ok_and(|key| key.kind == kind))
            .count())
    };
    let summary = SeedSummary {
        shard: seed.to_path_buf(),
        high_water_mark,
        traces: count(Namespace::Get, EventKind::Data)?,
        clouds: count(Namespace::Clouds, EventKind::Cloud)?,
        sha256: None,
    };
    store.close()?;
    Ok(summary)
}

/// Merges every shard of a campaign directory into one store.
///
/// Any previous merged output is removed first. With staging enabled the
/// merge runs against `<output>.partial`, which is renamed into place only
/// after the last shard commits; a failed run leaves the previous state
/// removed and the partial file behind for inspection.
pub fn merge_campaign<C: Container>(config: &MergeConfig) -> Result<MergeReport, ShardError> {
    let layout = config.layout(C::EXTENSION)?;
    let plan = discover_shards(&layout)?;
    let work = layout.work_path().to_path_buf();
    info!(
        source = %layout.source_dir.display(),
        shards = plan.shard_count(),
        output = %layout.output_path.display(),
        "merging campaign"
    );

    seed_store(&plan.seed, &work)?;
    let mut seed = summarize_seed::<C>(&plan.seed, &work)?;

    let total = plan.shards.len();
    let mut outcomes = Vec::with_capacity(total);
    for (position, shard) in plan.shards.iter().enumerate() {
        let outcome = merge_shard::<C>(&work, shard)?;
        info!(
            shard = %shard.display(),
            step = position + 1,
            total,
            offset = outcome.offset.value(),
            traces = outcome.traces_copied,
            clouds = outcome.clouds_copied,
            skipped = outcome.skipped.len(),
            high_water = outcome.high_water_after,
            "merged shard"
        );
        outcomes.push(outcome);
    }

    if let Some(staging) = &layout.staging_path {
        fs::rename(staging, &layout.output_path).map_err(|err| {
            ShardError::Store(
                ErrorInfo::new(codes::FINALIZE, err.to_string())
                    .with_context("staging", staging.display().to_string())
                    .with_path(&layout.output_path),
            )
        })?;
    }

    let mut output_sha256 = None;
    if config.hash_inputs {
        seed.sha256 = Some(sha256_file(&seed.shard)?);
        for outcome in &mut outcomes {
            outcome.sha256 = Some(sha256_file(&outcome.shard)?);
        }
        output_sha256 = Some(sha256_file(&layout.output_path)?);
    }

    let final_high_water_mark = outcomes
        .last()
        .map(|outcome| Some(outcome.high_water_after))
        .unwrap_or(seed.high_water_mark);
    let report = MergeReport {
        schema: REPORT_SCHEMA,
        output: layout.output_path.clone(),
        seed,
        shards: outcomes,
        final_high_water_mark,
        output_sha256,
    };
    if let Some(path) = &config.report {
        report.store(path)?;
    }
    info!(
        output = %report.output.display(),
        events = report.events_merged(),
        skipped = report.skipped().count(),
        high_water = ?report.final_high_water_mark,
        "campaign merged"
    );
    Ok(report)
}
