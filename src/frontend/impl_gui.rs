use crate::frontend::interface::Frontend;
use crate::frontend::render::{
    image_error_message, prediction_outcome, results_heading, subtitle, upload_error_outcome,
    Outcome, IMAGE_CAPTION, IMAGE_WIDTH, TITLE,
};
use crate::library::logger::interface::Logger;
use crate::model_holder::ModelHolder;
use crate::prediction::decode_image;
use crate::upload::Upload;
use eframe::egui;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;

pub struct FrontendGui {
    top_k: usize,
    holder: ModelHolder,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl FrontendGui {
    pub fn new(top_k: usize, holder: ModelHolder, logger: Arc<dyn Logger + Send + Sync>) -> Self {
        Self {
            top_k,
            holder,
            logger: logger.with_namespace("gui"),
        }
    }
}

impl Frontend for FrontendGui {
    fn run(self: Box<Self>) -> Result<(), Box<dyn Error + Send + Sync>> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([480.0, 720.0])
                .with_drag_and_drop(true),
            ..Default::default()
        };

        let window = ClassifierWindow::new(*self);

        // Blocks until the window is closed
        eframe::run_native(TITLE, options, Box::new(move |_cc| Box::new(window)))
            .map_err(|e| e.to_string())?;

        Ok(())
    }
}

struct SelectedImage {
    upload: Upload,
    texture: egui::TextureHandle,
}

enum Action {
    OpenPath,
    Predict,
}

struct ClassifierWindow {
    top_k: usize,
    holder: ModelHolder,
    logger: Arc<dyn Logger + Send + Sync>,
    path_input: String,
    selected: Option<SelectedImage>,
    outcome: Option<Outcome>,
}

impl ClassifierWindow {
    fn new(frontend: FrontendGui) -> Self {
        Self {
            top_k: frontend.top_k,
            holder: frontend.holder,
            logger: frontend.logger,
            path_input: String::new(),
            selected: None,
            outcome: None,
        }
    }

    fn open_path(&mut self, ctx: &egui::Context) {
        let path = self.path_input.trim().to_string();
        match std::fs::read(&path) {
            Ok(bytes) => self.select(ctx, &path, bytes),
            Err(e) => {
                let _ = self.logger.error(&format!("Could not read {}: {}", path, e));
                self.selected = None;
                self.outcome = Some(Outcome::ImageError(image_error_message(&e)));
            }
        }
    }

    fn open_dropped(&mut self, ctx: &egui::Context, file: egui::DroppedFile) {
        let name = match &file.path {
            Some(path) => path.to_string_lossy().to_string(),
            None => file.name.clone(),
        };

        let bytes = match (file.bytes, &file.path) {
            (Some(bytes), _) => Ok(bytes.to_vec()),
            (None, Some(path)) => std::fs::read(path),
            (None, None) => Ok(Vec::new()),
        };

        match bytes {
            Ok(bytes) => {
                self.path_input = name.clone();
                self.select(ctx, &name, bytes);
            }
            Err(e) => {
                self.selected = None;
                self.outcome = Some(Outcome::ImageError(image_error_message(&e)));
            }
        }
    }

    fn select(&mut self, ctx: &egui::Context, path: &str, bytes: Vec<u8>) {
        self.selected = None;
        self.outcome = None;

        let file_name = Path::new(path)
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string());

        let upload = match Upload::new(&file_name, bytes) {
            Ok(upload) => upload,
            Err(e) => {
                self.outcome = Some(upload_error_outcome(&e, self.logger.as_ref()));
                return;
            }
        };

        match decode_image(&upload.bytes) {
            Ok(rgb) => {
                let size = [rgb.width() as usize, rgb.height() as usize];
                let color_image = egui::ColorImage::from_rgb(size, rgb.as_raw());
                let texture =
                    ctx.load_texture("uploaded-image", color_image, egui::TextureOptions::LINEAR);
                let _ = self.logger.info(&format!(
                    "Selected {} ({}x{})",
                    upload.file_name, size[0], size[1]
                ));
                self.selected = Some(SelectedImage { upload, texture });
            }
            Err(e) => {
                let _ = self.logger.error(&format!("Could not decode {}: {}", file_name, e));
                self.outcome = Some(Outcome::ImageError(image_error_message(&e)));
            }
        }
    }

    fn predict(&mut self) {
        let Some(selected) = &self.selected else {
            return;
        };

        let model = self.holder.get_model();
        self.outcome = Some(prediction_outcome(
            model,
            &selected.upload.bytes,
            self.top_k,
            self.logger.as_ref(),
        ));
    }

    fn show(&self, ui: &mut egui::Ui) -> Option<Action> {
        let mut action = None;

        ui.heading(TITLE);
        ui.label(subtitle(self.top_k));
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label("Choose an image...");
            if ui.button("Open").clicked() {
                action = Some(Action::OpenPath);
            }
        });

        if !self.holder.is_loaded() {
            ui.weak("The model loads on the first prediction.");
        }

        if let Some(selected) = &self.selected {
            ui.add_space(8.0);
            ui.add(egui::Image::new(&selected.texture).max_width(IMAGE_WIDTH as f32));
            ui.label(IMAGE_CAPTION);

            if ui.button("Predict").clicked() {
                action = Some(Action::Predict);
            }
        }

        match &self.outcome {
            Some(Outcome::Results(lines)) => {
                ui.add_space(8.0);
                ui.heading(results_heading(self.top_k));
                for line in lines {
                    ui.label(line.text.as_str());
                    ui.add(egui::ProgressBar::new(line.fraction));
                }
            }
            Some(Outcome::ImageError(message)) | Some(Outcome::PredictionError(message)) => {
                ui.add_space(8.0);
                ui.colored_label(egui::Color32::RED, message.as_str());
            }
            None => {}
        }

        action
    }
}

impl eframe::App for ClassifierWindow {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if let Some(file) = dropped.into_iter().last() {
            self.open_dropped(ctx, file);
        }

        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Path:");
                ui.text_edit_singleline(&mut self.path_input);
            });
            egui::ScrollArea::vertical().show(ui, |ui| {
                action = self.show(ui);
            });
        });

        match action {
            Some(Action::OpenPath) => self.open_path(ctx),
            Some(Action::Predict) => self.predict(),
            None => {}
        }
    }
}
