//! On-disk test models shared by the integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use smo_model::geometry::{VERTEX_STRIDE, layout};

/// One vertex record with the given position and material slot
pub fn vertex(position: [f32; 3], slot: f32) -> Vec<f32> {
    let mut record = vec![0.0; VERTEX_STRIDE];
    record[layout::POSITION..layout::POSITION + 3].copy_from_slice(&position);
    record[layout::POSITION + 3] = 1.0;
    record[layout::NORMAL + 2] = 1.0;
    record[layout::AMBIENT] = 0.1;
    record[layout::DIFFUSE + 1] = 0.8;
    record[layout::TEXCOORD] = position[0];
    record[layout::TEXCOORD + 1] = position[1];
    record[layout::MATERIAL_INDEX] = slot;
    record[layout::HAS_TEXTURE] = 1.0;
    record[layout::SHININESS] = 16.0;
    record[layout::ALPHA] = 1.0;
    record[layout::RESERVED] = -1.0;
    record
}

/// Two triangles: one on the body, one on the arm
pub fn robot_buffer() -> Vec<f32> {
    [
        vertex([0.0, 0.0, 0.0], 0.0),
        vertex([0.5, 0.0, 0.0], 0.0),
        vertex([0.0, 1.0, 0.0], 0.0),
        vertex([0.0, 1.0, 0.0], 0.0),
        vertex([1.0, 1.0, 0.0], 0.0),
        vertex([0.0, 1.1, 0.1], 0.0),
    ]
    .concat()
}

pub const ROBOT_SMS: &str = "\
// robot skeleton
2
0
root
0
0
0
0
1
0
-1
180
180
180
-180
-180
-180
1
arm
0
1
0
1
1
0
0
90
90
90
-90
-90
-90
";

pub const WAVE_SMA: &str = "\
2
// root bends over
0
wave
20
2
0
0
0
1
0
0
90
11
// arm swings back
1
wave
20
2
0
0
0
1
0
0
-90
11
";

pub const SPIN_SMA: &str = "\
2
0
spin
10
2
0
170
0
1
0
-170
0
3
1
spin
10
0
";

fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Write the robot model into `dir` and return the umbrella path
pub fn write_robot(dir: &Path) -> PathBuf {
    let mesh = smo_model::format::smm::write(
        Vec::new(),
        &robot_buffer(),
        &["robot.png".to_string()],
    )
    .unwrap();
    write(dir, "robot.smm", &mesh);
    write(dir, "robot.png", b"image bytes");
    write(dir, "robot.sms", ROBOT_SMS.as_bytes());
    write(dir, "wave.sma", WAVE_SMA.as_bytes());
    write(dir, "spin.sma", SPIN_SMA.as_bytes());
    write(
        dir,
        "robot.smo",
        b"// robot\nrobot.smm\nrobot.sms\nwave.sma\nspin.sma\n",
    )
}

pub const CUBE_OBJ: &str = "\
# unit cube, two materials
mtllib cube.mtl
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
v 0 0 1
v 1 0 1
v 1 1 1
v 0 1 1
vt 0 0
vt 1 0
vt 1 1
vt 0 1
usemtl wood
f 1/1 4/4 3/3 2/2
f 5/1 6/2 7/3 8/4
f 1/1 2/2 6/3 5/4
usemtl metal
f 4/1 8/2 7/3 3/4
f 1/1 5/2 8/3 4/4
f 2/1 3/2 7/3 6/4
";

pub const CUBE_MTL: &str = "\
newmtl wood
Ka 0.2 0.1 0.0
Kd 0.6 0.4 0.2
map_Kd wood.png
newmtl metal
Kd 0.7 0.7 0.7
Ks 1 1 1
Ns 64
d 0.9
";

/// Write the cube OBJ and its MTL into `dir` and return the OBJ path
pub fn write_cube(dir: &Path, with_texture: bool) -> PathBuf {
    write(dir, "cube.mtl", CUBE_MTL.as_bytes());
    if with_texture {
        write(dir, "wood.png", b"image bytes");
    }
    write(dir, "cube.obj", CUBE_OBJ.as_bytes())
}
