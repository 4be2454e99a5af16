use crate::cli::AssociateArgs;
use crate::hla::normalize_allele_table;
use crate::utils::{create_writer, read_cluster_table, read_hla_table, Result};
use crate::workflows::{prepare_inputs, run_association, RunParams};
use crate::writers::{AssociationLayout, CsvReportWriter};
use rayon::ThreadPoolBuilder;
use std::time;

pub fn associate(args: AssociateArgs) -> Result<()> {
    let start_timer = time::Instant::now();
    let params = RunParams {
        association: args.association_params(),
        min_donors: args.min_donors,
        min_count: args.min_count,
        seed: args.seed,
    };
    params.association.validate()?;

    let records = read_cluster_table(&args.clusters_path, &args.sample_column)?;
    log::info!(
        "Read {} clonotypes from {}",
        records.len(),
        args.clusters_path.display()
    );
    let table = normalize_allele_table(&read_hla_table(&args.hla_path)?)?;
    log::info!(
        "Read {} samples with {} distinct alleles from {}",
        table.n_samples(),
        table.n_alleles(),
        args.hla_path.display()
    );

    let input = prepare_inputs(records, &table, &params);
    if input.clusters.is_empty() {
        log::warn!(
            "No cluster spans at least {} donors; reports will be empty",
            params.min_donors
        );
    }

    log::debug!(
        "Initializing thread pool with {} threads...",
        args.num_threads
    );
    let pool = initialize_thread_pool(args.num_threads)?;
    let outcome = pool.install(|| run_association(&input, &params))?;

    let prefix = &args.output_prefix;
    create_writer(prefix, "associations.csv", CsvReportWriter::new)?
        .write_associations(&outcome.real.results, AssociationLayout::Full)?;
    create_writer(prefix, "significant.csv", CsvReportWriter::new)?
        .write_associations(&outcome.real.results, AssociationLayout::Significant)?;
    create_writer(prefix, "clonotypes.csv", CsvReportWriter::new)?
        .write_clonotypes(&input.clusters, &outcome.significant)?;
    create_writer(prefix, "shuffled.associations.csv", CsvReportWriter::new)?
        .write_associations(&outcome.shuffled.results, AssociationLayout::Full)?;
    create_writer(prefix, "stats.csv", CsvReportWriter::new)?.write_stats(&outcome.summary)?;

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    Ok(())
}

fn initialize_thread_pool(num_threads: usize) -> Result<rayon::ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .thread_name(|i| format!("metaclonotypist-{}", i))
        .build()
        .map_err(|e| format!("Failed to initialize thread pool: {}", e))
}
