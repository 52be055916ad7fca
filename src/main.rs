use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use annotate_ocr::adapters::{HttpProjectRepository, HttpRecognitionService, JsonFileSessionStore};
use annotate_ocr::core::models::{Image, Shape, UserSettings};
use annotate_ocr::core::orchestrators::AnnotationSession;
use annotate_ocr::global_constants;

#[derive(Debug, Parser)]
#[command(name = "annotate-ocr", about = "Batch OCR over an annotation session")]
struct Cli {
    /// Load this project from the project service before recognizing.
    #[arg(long)]
    project: Option<String>,

    /// Start from the last autosaved session.
    #[arg(long)]
    restore: bool,

    /// Image file to add to the session. Repeatable.
    #[arg(long = "image")]
    images: Vec<PathBuf>,

    /// Give images without annotations a single box covering the whole page.
    #[arg(long)]
    full_image: bool,

    /// Save every image's ground truth to the project service afterwards.
    #[arg(long)]
    save: bool,
}

fn load_image_file(path: &Path) -> Result<Image> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read image {:?}", path))?;
    let (width, height) = image::ImageReader::open(path)
        .with_context(|| format!("Failed to open image {:?}", path))?
        .with_guessed_format()?
        .into_dimensions()
        .with_context(|| format!("Failed to read dimensions of {:?}", path))?;

    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(Image::from_bytes(&name, width, height, &bytes))
}

fn add_full_image_boxes(session: &mut AnnotationSession) {
    let pages: Vec<(String, u32, u32)> = session
        .images()
        .iter()
        .filter(|image| session.annotations().get(&image.id).is_empty())
        .map(|image| (image.id.clone(), image.width, image.height))
        .collect();

    for (image_id, width, height) in pages {
        session.select_image(&image_id);
        session.add_annotation(Shape::rectangle(0.0, 0.0, width as f64, height as f64));
    }

    if let Some(first_id) = session.images().first().map(|image| image.id.clone()) {
        session.select_image(&first_id);
    }
}

fn print_accuracy_report(session: &AnnotationSession) {
    println!("{:<40} {:>8} {:>10}", "image", "regions", "accuracy");
    for image in session.images() {
        let regions = session.annotations().get(&image.id).len();
        let accuracy = session
            .annotations()
            .mean_accuracy(&image.id)
            .map(|accuracy| format!("{:.3}", accuracy))
            .unwrap_or_else(|| "-".to_string());
        println!("{:<40} {:>8} {:>10}", image.name, regions, accuracy);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    log::info!("[MAIN] Starting {}", global_constants::APPLICATION_NAME);

    let settings = UserSettings::load().unwrap_or_else(|error| {
        log::warn!("[MAIN] Failed to load settings, using defaults: {:#}", error);
        UserSettings::default()
    });

    let recognition_service = Arc::new(HttpRecognitionService::build(&settings)?);
    let project_repository = Arc::new(HttpProjectRepository::build(&settings)?);
    let snapshot_store = Arc::new(JsonFileSessionStore::default_location()?);

    let mut session = AnnotationSession::build(
        recognition_service,
        project_repository,
        snapshot_store,
        settings,
    );

    if cli.restore {
        session.restore_autosave().await;
    }

    if let Some(project_id) = cli.project.as_deref() {
        let loaded = session.open_project(project_id).await;
        log::info!("[MAIN] Project {} opened with {} images", project_id, loaded);
    }

    let mut new_images = Vec::with_capacity(cli.images.len());
    for path in &cli.images {
        new_images.push(load_image_file(path)?);
    }
    if !new_images.is_empty() {
        session.add_images(new_images);
    }

    if cli.full_image {
        add_full_image_boxes(&mut session);
    }

    let cancel_token = CancellationToken::new();
    let signal_token = cancel_token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("[MAIN] Interrupt received, stopping after the current image");
            signal_token.cancel();
        }
    });

    let report = session
        .recognize_all(&cancel_token, |progress| {
            if progress.running {
                log::info!(
                    "[MAIN] Recognition {}/{} ({}%)",
                    progress.current,
                    progress.total,
                    progress.percent
                );
            }
        })
        .await;

    for error in &report.failed {
        log::error!("[MAIN] {}", error);
    }
    if report.cancelled {
        log::warn!("[MAIN] Batch cancelled after {} images", report.processed_count());
    }

    print_accuracy_report(&session);

    if cli.save {
        let image_ids: Vec<String> = session.images().iter().map(|image| image.id.clone()).collect();
        let mut handles = Vec::with_capacity(image_ids.len());
        for image_id in &image_ids {
            session.select_image(image_id);
            handles.extend(session.save_current_image());
        }
        for handle in handles {
            if let Err(error) = handle.await {
                log::error!("[MAIN] Save task failed: {}", error);
            }
        }
    }

    session.flush_autosave().await;
    Ok(())
}
