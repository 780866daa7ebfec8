//! Model command implementations

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use glam::{Mat4, Vec3};
use serde::Serialize;
use smo_model::animation::{compose_world_matrices_uniform, transformed_end_points};
use smo_model::format::{sma, smm, smo, sms};
use smo_model::{LoadOptions, Model, ModelFormat, Skeleton};

use crate::utils::{
    NodeType, TreeNode, TreeOptions, add_table_row, create_table, format_color, format_vec3,
    render_tree,
};

#[derive(Subcommand)]
pub enum ModelCommands {
    /// Display information about a model
    Info {
        /// Path to the .smo, .smm, or .obj file
        file: PathBuf,

        /// Show per-bone and per-animation tables
        #[arg(short, long)]
        detailed: bool,

        /// Skip unopenable member files instead of failing
        #[arg(short, long)]
        partial: bool,
    },

    /// Display the bone hierarchy and materials as a tree
    Tree {
        /// Path to the model file
        file: PathBuf,

        /// Maximum depth to display
        #[arg(short, long)]
        depth: Option<usize>,

        /// Hide texture references
        #[arg(long)]
        no_refs: bool,

        /// Hide bone and material details
        #[arg(long)]
        compact: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Evaluate every bone at one animation frame
    Pose {
        /// Path to the model file
        file: PathBuf,

        /// Animation name or index
        #[arg(short, long, default_value = "0")]
        animation: String,

        /// Frame to sample
        #[arg(short, long, default_value = "1")]
        frame: f32,

        /// Print world matrices and end points as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a model strictly and check its structure
    Validate {
        /// Path to the model file
        file: PathBuf,
    },

    /// Write a model as SMM, or as an SMO umbrella with its member files
    Convert {
        /// Input model file
        input: PathBuf,

        /// Output .smm or .smo file
        output: PathBuf,
    },
}

pub fn execute(cmd: ModelCommands) -> Result<()> {
    match cmd {
        ModelCommands::Info {
            file,
            detailed,
            partial,
        } => handle_info(&file, detailed, partial),
        ModelCommands::Tree {
            file,
            depth,
            no_refs,
            compact,
            no_color,
        } => handle_tree(&file, depth, !no_refs, !compact, no_color),
        ModelCommands::Pose {
            file,
            animation,
            frame,
            json,
        } => handle_pose(&file, &animation, frame, json),
        ModelCommands::Validate { file } => handle_validate(&file),
        ModelCommands::Convert { input, output } => handle_convert(&input, &output),
    }
}

fn load(path: &Path, partial: bool) -> Result<Model> {
    let options = LoadOptions::new().allow_partial(partial);
    Model::load(path, &options)
        .with_context(|| format!("Failed to load model from {}", path.display()))
}

fn handle_info(path: &Path, detailed: bool, partial: bool) -> Result<()> {
    let model = load(path, partial)?;
    let skeleton = model.skeleton();

    println!("=== Model Information ===");
    println!("Name:       {}", model.name());
    println!("Format:     {}", model.format());
    println!("Triangles:  {}", model.triangles().len());
    println!("Vertices:   {}", model.vertex_count());
    println!("Materials:  {}", model.materials().len());
    println!(
        "Textures:   {} of {} found",
        model.texture_files().iter().flatten().count(),
        model.texture_files().len()
    );
    println!("Bones:      {}", skeleton.len());
    println!("Animations: {}", skeleton.animation_count());

    println!("\n=== Materials ===");
    let mut table = create_table(&[
        "Slot", "Name", "Ambient", "Diffuse", "Specular", "Shine", "Alpha", "Texture",
    ]);
    for (slot, material) in model.materials().iter().enumerate() {
        add_table_row(
            &mut table,
            vec![
                slot.to_string(),
                material.name.clone(),
                format_color(material.ambient),
                format_color(material.diffuse),
                format_color(material.specular),
                format!("{:.1}", material.shininess),
                format!("{:.2}", material.alpha),
                material
                    .texture
                    .as_ref()
                    .map_or_else(|| "-".to_string(), |t| t.display().to_string()),
            ],
        );
    }
    table.printstd();

    if let Some(root) = skeleton.root()
        && !root.animations.is_empty()
    {
        println!("\n=== Animations ===");
        let mut table = create_table(&["Id", "Name", "Length", "Root keys"]);
        for (id, animation) in root.animations.iter().enumerate() {
            add_table_row(
                &mut table,
                vec![
                    id.to_string(),
                    animation.name.clone(),
                    animation.length.to_string(),
                    animation.keyframes.len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    if detailed && !skeleton.is_empty() {
        println!("\n=== Bones ===");
        let mut table = create_table(&["Id", "Name", "Parent", "Pivot", "End", "Animations"]);
        for bone in skeleton.iter() {
            add_table_row(
                &mut table,
                vec![
                    bone.id.to_string(),
                    bone.name.clone(),
                    bone.parent.map_or_else(|| "-".to_string(), |p| p.to_string()),
                    format_vec3(bone.pivot),
                    format_vec3(bone.end),
                    bone.animations.len().to_string(),
                ],
            );
        }
        table.printstd();
    }

    let report = model.load_report();
    if !report.is_complete() {
        println!("\n=== Skipped ===");
        for item in report.skipped() {
            println!("  {} {}: {}", item.kind, item.target, item.reason);
        }
    }

    Ok(())
}

fn bone_node(skeleton: &Skeleton, id: usize, details: bool) -> TreeNode {
    let Some(bone) = skeleton.get(id) else {
        return TreeNode::new(format!("<missing bone {id}>"), NodeType::Bone);
    };
    let mut node = TreeNode::new(format!("{} [{}]", bone.name, bone.id), NodeType::Bone);
    if details {
        node = node
            .with_metadata("pivot", format_vec3(bone.pivot))
            .with_metadata("end", format_vec3(bone.end));
    }
    for &child in &bone.children {
        node = node.add_child(bone_node(skeleton, child, details));
    }
    node
}

fn handle_tree(
    path: &Path,
    max_depth: Option<usize>,
    show_refs: bool,
    details: bool,
    no_color: bool,
) -> Result<()> {
    let model = load(path, true)?;
    let skeleton = model.skeleton();

    let mut root = TreeNode::new(model.name(), NodeType::Root)
        .with_metadata("format", model.format())
        .with_metadata("triangles", model.triangles().len());

    let mut materials = TreeNode::new("Materials", NodeType::Group);
    for (slot, material) in model.materials().iter().enumerate() {
        let mut node = TreeNode::new(format!("{} [{}]", material.name, slot), NodeType::Material);
        if details {
            node = node
                .with_metadata("diffuse", format_color(material.diffuse))
                .with_metadata("alpha", format!("{:.2}", material.alpha));
        }
        if let Some(texture) = &material.texture {
            node = node.with_external_ref(&texture.display().to_string(), material.has_texture);
        } else if let Some(Some(file)) = model.texture_files().get(slot) {
            node = node.with_external_ref(&file.display().to_string(), true);
        }
        materials = materials.add_child(node);
    }
    root = root.add_child(materials);

    if let Some(bone) = skeleton.root() {
        root = root.add_child(
            TreeNode::new("Bones", NodeType::Group).add_child(bone_node(skeleton, bone.id, details)),
        );
        let mut animations = TreeNode::new("Animations", NodeType::Group);
        for animation in &bone.animations {
            animations = animations.add_child(
                TreeNode::new(&animation.name, NodeType::Animation)
                    .with_metadata("length", animation.length),
            );
        }
        root = root.add_child(animations);
    }

    let options = TreeOptions {
        max_depth,
        show_external_refs: show_refs,
        no_color,
        show_metadata: true,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

/// Resolve an animation given by index or by name on the root bone
fn animation_id(model: &Model, animation: &str) -> Result<usize> {
    let id = match animation.parse::<usize>() {
        Ok(id) => id,
        Err(_) => model
            .animation_id(animation)
            .with_context(|| format!("No animation named '{animation}'"))?,
    };
    // Bones with no animations fall back to their rest rotation
    if let Some(bone) = model
        .skeleton()
        .iter()
        .find(|b| !b.animations.is_empty() && id >= b.animations.len())
    {
        bail!(
            "Animation {} is out of range for bone '{}' with {} animations",
            id,
            bone.name,
            bone.animations.len()
        );
    }
    Ok(id)
}

#[derive(Serialize)]
struct PoseReport<'a> {
    model: &'a str,
    animation: usize,
    frame: f32,
    bones: Vec<BonePose<'a>>,
}

#[derive(Serialize)]
struct BonePose<'a> {
    id: usize,
    name: &'a str,
    parent: Option<usize>,
    end: Vec3,
    world: Mat4,
}

fn handle_pose(path: &Path, animation: &str, frame: f32, json: bool) -> Result<()> {
    let model = load(path, false)?;
    let skeleton = model.skeleton();
    if skeleton.is_empty() {
        bail!("{} has no bones to pose", path.display());
    }
    let animation = animation_id(&model, animation)?;

    let world = compose_world_matrices_uniform(skeleton, animation, frame);
    let ends = transformed_end_points(skeleton, &world);

    if json {
        let report = PoseReport {
            model: model.name(),
            animation,
            frame,
            bones: skeleton
                .iter()
                .zip(world.iter().zip(&ends))
                .map(|(bone, (world, end))| BonePose {
                    id: bone.id,
                    name: &bone.name,
                    parent: bone.parent,
                    end: *end,
                    world: *world,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Pose of '{}' at animation {} frame {}",
        model.name(),
        animation,
        frame
    );
    let mut table = create_table(&["Id", "Name", "Rest end", "Posed end"]);
    for (bone, end) in skeleton.iter().zip(&ends) {
        add_table_row(
            &mut table,
            vec![
                bone.id.to_string(),
                bone.name.clone(),
                format_vec3(bone.end),
                format_vec3(*end),
            ],
        );
    }
    table.printstd();
    Ok(())
}

fn handle_validate(path: &Path) -> Result<()> {
    println!("Validating model: {}", path.display());

    let model = load(path, false)?;
    let skeleton = model.skeleton();
    skeleton
        .validate()
        .with_context(|| format!("Invalid bone hierarchy in {}", path.display()))?;
    for bone in skeleton.iter() {
        for animation in &bone.animations {
            animation.validate().with_context(|| {
                format!("Invalid animation '{}' on bone '{}'", animation.name, bone.name)
            })?;
        }
    }
    let counts: Vec<usize> = skeleton
        .iter()
        .map(|b| b.animations.len())
        .filter(|&n| n > 0)
        .collect();
    if counts.windows(2).any(|w| w[0] != w[1]) {
        log::warn!("Bones carry different numbers of animations: {:?}", counts);
    }

    let report = model.load_report();
    for item in report.skipped() {
        println!("  warning: {} {}: {}", item.kind, item.target, item.reason);
    }
    println!(
        "✓ {} triangles, {} materials, {} bones, {} animations",
        model.triangles().len(),
        model.materials().len(),
        skeleton.len(),
        skeleton.animation_count()
    );
    Ok(())
}

/// Texture names for an SMM file: entry `i` is sampled by material slot `i`
///
/// SMM can only express a textured prefix of the material table, so a
/// texture behind an untextured slot cannot be written.
fn texture_names(model: &Model) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for (slot, material) in model.materials().iter().enumerate() {
        match &material.texture {
            Some(texture) if names.len() == slot => names.push(texture.display().to_string()),
            Some(texture) => bail!(
                "Cannot write texture {} of material slot {} ('{}'): an earlier slot has no texture",
                texture.display(),
                slot,
                material.name
            ),
            None => {}
        }
    }
    Ok(names)
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn handle_convert(input: &Path, output: &Path) -> Result<()> {
    let model = load(input, false)?;
    let format = ModelFormat::from_path(output)
        .with_context(|| format!("Unsupported output {}", output.display()))?;

    let textures = texture_names(&model)?;
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| model.name().to_string());

    match format {
        ModelFormat::Smm => {
            smm::write(create(output)?, model.vertex_data(), &textures)?;
        }
        ModelFormat::Smo => {
            let dir = output.parent().unwrap_or_else(|| Path::new(""));
            let umbrella = smo::Umbrella {
                mesh: format!("{stem}.smm"),
                skeleton: format!("{stem}.sms"),
                animations: if model.skeleton().animation_count() > 0 {
                    vec![format!("{stem}.sma")]
                } else {
                    Vec::new()
                },
            };
            smm::write(create(&umbrella.mesh_path(dir))?, model.vertex_data(), &textures)?;
            sms::write(create(&umbrella.skeleton_path(dir))?, model.skeleton())?;
            for file in umbrella.animation_paths(dir) {
                sma::write(create(&file)?, model.skeleton())?;
            }
            smo::write(create(output)?, &umbrella)?;
        }
        ModelFormat::Obj => bail!("Writing OBJ files is not supported"),
    }

    println!(
        "Converted {} ({}) to {} ({})",
        input.display(),
        model.format(),
        output.display(),
        format
    );
    Ok(())
}
