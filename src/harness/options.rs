// src/harness/options.rs
//! Per-load harness configuration

use crate::interception::mock_resolver::MockModules;
use crate::interception::patcher::GlobalPatches;
use crate::runtime::value::Value;

/// Options for a single harness load
#[derive(Debug, Clone, Default)]
pub struct HarnessOptions {
    /// Substitute modules for dependencies of every module loaded
    pub mocked_modules: Option<MockModules>,

    /// Make the target module believe it was not required
    pub fake_not_required: bool,

    /// Member overrides for globals such as `process`
    pub global_patches: Option<GlobalPatches>,
}

impl HarnessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mocked_modules(mut self, mocks: MockModules) -> Self {
        self.mocked_modules = Some(mocks);
        self
    }

    /// Add a single mock, creating the table if needed
    pub fn mock(mut self, id: impl Into<String>, exports: impl Into<Value>) -> Self {
        let mocks = self.mocked_modules.take().unwrap_or_default();
        self.mocked_modules = Some(mocks.with(id, exports));
        self
    }

    pub fn fake_not_required(mut self, enabled: bool) -> Self {
        self.fake_not_required = enabled;
        self
    }

    pub fn with_global_patches(mut self, patches: GlobalPatches) -> Self {
        self.global_patches = Some(patches);
        self
    }

    /// Override one member of a global, creating the patch set if needed
    pub fn patch(mut self, global: &str, member: &str, value: impl Into<Value>) -> Self {
        let patches = self.global_patches.take().unwrap_or_default();
        self.global_patches = Some(patches.patch(global, member, value));
        self
    }
}
