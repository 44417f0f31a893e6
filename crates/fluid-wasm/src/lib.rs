use fluid_core::config::{FluidConfig, InteractionInput, Obstacle};
use fluid_core::solver::FluidSim;
use fluid_core::spawn::{SpawnRegion, SpawnSettings};
use glam::Vec3;
use wasm_bindgen::prelude::*;

/// GPU-compatible particle struct: 32 bytes, matches the WGSL render input
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuParticle {
    position: [f32; 3], // 12 bytes
    density: f32,       //  4 bytes
    velocity: [f32; 3], // 12 bytes
    near_density: f32,  //  4 bytes
}

#[wasm_bindgen]
pub struct FluidWorld {
    sim: FluidSim,
    spawn: SpawnSettings,
    gpu_buffer: Vec<GpuParticle>,
}

fn to_js(err: fluid_core::SimError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
impl FluidWorld {
    /// Fill one box of `spawn_size` centred at the spawn point with
    /// `spawn_density` particles per unit volume.
    #[wasm_bindgen(constructor)]
    pub fn new(
        smoothing_radius: f32,
        bounds_x: f32,
        bounds_y: f32,
        bounds_z: f32,
        spawn_x: f32,
        spawn_y: f32,
        spawn_z: f32,
        spawn_size: f32,
        spawn_density: f32,
    ) -> Result<FluidWorld, JsValue> {
        let config = FluidConfig {
            smoothing_radius,
            bounds_size: Vec3::new(bounds_x, bounds_y, bounds_z),
            ..FluidConfig::default()
        };
        let spawn = SpawnSettings {
            regions: vec![SpawnRegion {
                centre: Vec3::new(spawn_x, spawn_y, spawn_z),
                size: Vec3::splat(spawn_size),
            }],
            density: spawn_density,
            ..SpawnSettings::default()
        };

        let sim = FluidSim::new(config, &spawn).map_err(to_js)?;
        web_sys::console::log_1(
            &format!("WASM FluidWorld created: {} particles", sim.particle_count()).into(),
        );

        let mut world = FluidWorld {
            gpu_buffer: Vec::new(),
            sim,
            spawn,
        };
        world.write_gpu_output();
        Ok(world)
    }

    /// Run one frame and return the CPU time it took in milliseconds.
    #[wasm_bindgen]
    pub fn step(&mut self, frame_dt: f32) -> f32 {
        let start = js_sys::Date::now();
        self.sim.run_frame(frame_dt);
        self.write_gpu_output();
        let elapsed = js_sys::Date::now() - start;
        elapsed as f32
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_ptr(&self) -> *const f32 {
        self.gpu_buffer.as_ptr() as *const f32
    }

    #[wasm_bindgen]
    pub fn get_gpu_buffer_byte_length(&self) -> usize {
        self.gpu_buffer.len() * std::mem::size_of::<GpuParticle>()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.sim.particle_count()
    }

    /// Sub-steps run by the last `step` call.
    #[wasm_bindgen]
    pub fn last_sub_steps(&self) -> u32 {
        self.sim.last_frame().sub_steps
    }

    #[wasm_bindgen]
    pub fn max_cell_occupancy(&self) -> u32 {
        self.sim.last_frame().max_cell_occupancy
    }

    #[wasm_bindgen]
    pub fn set_fluid_config(
        &mut self,
        target_density: f32,
        pressure_multiplier: f32,
        near_pressure_multiplier: f32,
        viscosity_strength: f32,
    ) {
        let config = FluidConfig {
            target_density,
            pressure_multiplier,
            near_pressure_multiplier,
            viscosity_strength,
            ..self.sim.config().clone()
        };
        self.apply_config(config);
    }

    #[wasm_bindgen]
    pub fn set_time_config(
        &mut self,
        time_scale: f32,
        max_timestep_fps: f32,
        iterations_per_frame: u32,
        gravity: f32,
        collision_damping: f32,
    ) {
        let config = FluidConfig {
            time_scale,
            max_timestep_fps,
            iterations_per_frame,
            gravity,
            collision_damping,
            ..self.sim.config().clone()
        };
        self.apply_config(config);
    }

    #[wasm_bindgen]
    pub fn set_interaction_config(&mut self, radius: f32, strength: f32) {
        let config = FluidConfig {
            interaction_radius: radius,
            interaction_strength: strength,
            ..self.sim.config().clone()
        };
        self.apply_config(config);
    }

    /// Oriented box obstacle; rotation is XYZ Euler angles in degrees.
    #[wasm_bindgen]
    pub fn set_box_obstacle(&mut self, centre: &[f32], size: &[f32], rotation: &[f32]) {
        if let (Ok(c), Ok(s), Ok(r)) = (
            <[f32; 3]>::try_from(centre),
            <[f32; 3]>::try_from(size),
            <[f32; 3]>::try_from(rotation),
        ) {
            self.set_obstacle(Obstacle::Box {
                centre: Vec3::from(c),
                size: Vec3::from(s),
                rotation: Vec3::from(r),
            });
        }
    }

    #[wasm_bindgen]
    pub fn set_sphere_obstacle(&mut self, x: f32, y: f32, z: f32, radius: f32) {
        self.set_obstacle(Obstacle::Sphere {
            centre: Vec3::new(x, y, z),
            radius,
        });
    }

    #[wasm_bindgen]
    pub fn clear_obstacle(&mut self) {
        self.set_obstacle(Obstacle::None);
    }

    #[wasm_bindgen]
    pub fn set_interaction(&mut self, x: f32, y: f32, z: f32, pull: bool, push: bool) {
        self.sim.interaction = InteractionInput {
            point: Vec3::new(x, y, z),
            pull,
            push,
        };
    }

    /// Respawn every particle, optionally with a new radius and domain.
    #[wasm_bindgen]
    pub fn reset(
        &mut self,
        smoothing_radius: f32,
        bounds_x: f32,
        bounds_y: f32,
        bounds_z: f32,
    ) -> Result<(), JsValue> {
        let config = FluidConfig {
            smoothing_radius,
            bounds_size: Vec3::new(bounds_x, bounds_y, bounds_z),
            ..self.sim.config().clone()
        };
        self.sim.reset(config, &self.spawn).map_err(to_js)?;
        web_sys::console::log_1(
            &format!("WASM FluidWorld reset: {} particles", self.sim.particle_count()).into(),
        );
        self.write_gpu_output();
        Ok(())
    }

    /// Index of the nearest particle hit by the ray, or -1 on a miss.
    #[wasm_bindgen]
    pub fn pick(
        &self,
        origin_x: f32,
        origin_y: f32,
        origin_z: f32,
        dir_x: f32,
        dir_y: f32,
        dir_z: f32,
        radius: f32,
    ) -> i32 {
        self.sim
            .pick(
                Vec3::new(origin_x, origin_y, origin_z),
                Vec3::new(dir_x, dir_y, dir_z),
                radius,
            )
            .map_or(-1, |hit| hit.index as i32)
    }
}

impl FluidWorld {
    fn set_obstacle(&mut self, obstacle: Obstacle) {
        let config = FluidConfig {
            obstacle,
            ..self.sim.config().clone()
        };
        self.apply_config(config);
    }

    fn apply_config(&mut self, config: FluidConfig) {
        if let Err(err) = self.sim.update_config(config) {
            web_sys::console::warn_1(&format!("config rejected: {}", err).into());
        }
    }

    fn write_gpu_output(&mut self) {
        let count = self.sim.particle_count();
        self.gpu_buffer.resize(count, bytemuck::Zeroable::zeroed());

        let particles = &self.sim.particles;
        for i in 0..count {
            let pos = particles.position[i];
            let vel = particles.velocity[i];
            let d = particles.density[i];
            self.gpu_buffer[i] = GpuParticle {
                position: pos.to_array(),
                density: d.density,
                velocity: vel.to_array(),
                near_density: d.near,
            };
        }
    }
}
