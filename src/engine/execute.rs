use super::{Command, CubeEngine};
use crate::error::CubefieldError;
use crate::layout::LayoutStrategy;
use crate::scene::record::RecordId;

impl CubeEngine {
    /// Execute one command.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::Gpu`] if a delete cannot reallocate the
    /// scene buffers or a GPU pick cannot be read back. The scene is
    /// unchanged in both cases.
    pub fn execute(&mut self, command: Command) -> Result<(), CubefieldError> {
        match command {
            Command::Look { dx, dy } => self.camera.look(dx, dy),
            Command::Pick { x, y, extend } => self.click(x, y, extend)?,
            Command::CycleLayout => {
                let next = self.scene.strategy().next();
                self.set_layout(next);
            }
            Command::SetLayout(strategy) => self.set_layout(strategy),
            Command::Select { id, selected } => {
                if !self.scene.select(id.as_str(), selected) {
                    log::debug!("select: no record with id '{id}'");
                }
            }
            Command::ClearSelection => self.scene.clear(),
            Command::DeleteSelected => {
                let removed = self.scene.delete_selected()?;
                log::debug!("delete selected: {removed} records removed");
            }
        }
        Ok(())
    }

    /// Id of the nearest record under pixel `(x, y)`.
    ///
    /// Uses the compute-shader picker when enabled, the CPU path
    /// otherwise; both apply the same hit rule.
    ///
    /// # Errors
    ///
    /// Returns [`CubefieldError::Gpu`] if the GPU result cannot be read
    /// back.
    pub fn pick_at(
        &mut self,
        x: f32,
        y: f32,
    ) -> Result<Option<RecordId>, CubefieldError> {
        let (width, height) = self.context.size();
        let Some(ray) = self.camera.camera.screen_ray(x, y, width, height)
        else {
            return Ok(None);
        };
        let Some(picker) = self.picker.as_mut() else {
            return Ok(self.scene.pick(&ray));
        };
        let hit = picker.pick(
            &self.context,
            self.scene.attributes_view(),
            &ray,
            self.scene.pick_radius_scale(),
        )?;
        Ok(hit.and_then(|hit| self.scene.record_id_at(hit.slot)))
    }

    fn click(
        &mut self,
        x: f32,
        y: f32,
        extend: bool,
    ) -> Result<(), CubefieldError> {
        let hit = self.pick_at(x, y)?;
        match (hit, extend) {
            (Some(id), true) => {
                let _ = self.scene.toggle(id.as_str());
            }
            (Some(id), false) => {
                let only_this = self.scene.selected().len() == 1
                    && self.scene.selected().contains(&id);
                self.scene.clear();
                if !only_this {
                    let _ = self.scene.select(id.as_str(), true);
                }
            }
            (None, false) => self.scene.clear(),
            (None, true) => {}
        }
        Ok(())
    }

    fn set_layout(&mut self, strategy: LayoutStrategy) {
        self.scene.set_strategy(strategy);
        self.options.layout.strategy = strategy;
        log::info!("layout strategy: {strategy}");
    }
}
