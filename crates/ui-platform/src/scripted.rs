//! Scripted in-memory device.
//!
//! Implements both platform ports from a declarative [`DeviceScene`]: each app
//! owns an ordered list of screens, nodes may move the app to another screen
//! when clicked, and edit fields decide per node how they react to set-text.
//! Every dispatched action is written to a journal so tests can assert on the
//! exact sequence the automation produced.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::PlatformError;
use crate::intent::LaunchIntent;
use crate::ports::{AccessibilityPort, AppLifecyclePort, NodeAction};
use crate::tree::{NodeAttrs, NodeHandle, NodeId, NodeSpec, TreeGeneration, UiTree};

fn default_true() -> bool {
    true
}

/// How an edit field reacts to a set-text action.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetTextBehavior {
    /// Any set-text is acknowledged.
    #[default]
    Accept,
    /// Every set-text is refused.
    Reject,
    /// Acknowledged only after the node was clicked or focused.
    RequiresFocus,
    /// Only accepts clearing or growing the content by exactly one character.
    PerCharacter,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptedNode {
    #[serde(flatten)]
    pub attrs: NodeAttrs,
    /// Screen shown after this node is clicked.
    #[serde(default)]
    pub on_click: Option<String>,
    #[serde(default)]
    pub set_text: SetTextBehavior,
    #[serde(default)]
    pub children: Vec<ScriptedNode>,
}

impl ScriptedNode {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            attrs: NodeAttrs {
                class_name: class_name.into(),
                ..NodeAttrs::default()
            },
            ..Self::default()
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.attrs.text = Some(text.into());
        self
    }

    pub fn hint(mut self, hint: impl Into<String>) -> Self {
        self.attrs.hint = Some(hint.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.attrs.description = Some(description.into());
        self
    }

    pub fn editable(mut self) -> Self {
        self.attrs.editable = true;
        self.attrs.focusable = true;
        self
    }

    pub fn clickable(mut self) -> Self {
        self.attrs.clickable = true;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.attrs.enabled = enabled;
        self
    }

    pub fn on_click(mut self, screen: impl Into<String>) -> Self {
        self.on_click = Some(screen.into());
        self
    }

    pub fn set_text(mut self, behavior: SetTextBehavior) -> Self {
        self.set_text = behavior;
        self
    }

    pub fn child(mut self, child: ScriptedNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = ScriptedNode>) -> Self {
        self.children.extend(children);
        self
    }

    fn to_spec(&self, counter: &mut u32, texts: &HashMap<NodeId, String>) -> NodeSpec {
        let id = NodeId(*counter);
        *counter += 1;
        let mut attrs = self.attrs.clone();
        if let Some(text) = texts.get(&id) {
            attrs.text = Some(text.clone());
        }
        NodeSpec {
            attrs,
            children: self
                .children
                .iter()
                .map(|child| child.to_spec(counter, texts))
                .collect(),
        }
    }

    fn find(&self, target: NodeId, counter: &mut u32) -> Option<&ScriptedNode> {
        if *counter == target.0 {
            return Some(self);
        }
        *counter += 1;
        for child in &self.children {
            if let Some(found) = child.find(target, counter) {
                return Some(found);
            }
        }
        None
    }
}

impl From<NodeSpec> for ScriptedNode {
    fn from(spec: NodeSpec) -> Self {
        Self {
            attrs: spec.attrs,
            on_click: None,
            set_text: SetTextBehavior::default(),
            children: spec.children.into_iter().map(ScriptedNode::from).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneScreen {
    pub name: String,
    /// Number of tree reads answered with "nothing rendered" after the screen appears.
    #[serde(default)]
    pub loading_polls: u32,
    /// Screen shown on system back.
    #[serde(default)]
    pub on_back: Option<String>,
    pub root: ScriptedNode,
}

impl SceneScreen {
    pub fn new(name: impl Into<String>, root: ScriptedNode) -> Self {
        Self {
            name: name.into(),
            loading_polls: 0,
            on_back: None,
            root,
        }
    }

    pub fn loading_polls(mut self, polls: u32) -> Self {
        self.loading_polls = polls;
        self
    }

    pub fn on_back(mut self, screen: impl Into<String>) -> Self {
        self.on_back = Some(screen.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneApp {
    pub package: String,
    #[serde(default = "default_true")]
    pub installed: bool,
    #[serde(default = "default_true")]
    pub launchable: bool,
    /// Tree reads fail with an internal platform error.
    #[serde(default)]
    pub fail_tree_reads: bool,
    #[serde(default)]
    pub screens: Vec<SceneScreen>,
}

impl SceneApp {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            installed: true,
            launchable: true,
            fail_tree_reads: false,
            screens: Vec::new(),
        }
    }

    pub fn not_installed(mut self) -> Self {
        self.installed = false;
        self
    }

    pub fn not_launchable(mut self) -> Self {
        self.launchable = false;
        self
    }

    pub fn failing_tree_reads(mut self) -> Self {
        self.fail_tree_reads = true;
        self
    }

    pub fn screen(mut self, screen: SceneScreen) -> Self {
        self.screens.push(screen);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceScene {
    #[serde(default)]
    pub apps: Vec<SceneApp>,
}

impl DeviceScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app(mut self, app: SceneApp) -> Self {
        self.apps.push(app);
        self
    }
}

/// One line of the device journal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JournalEntry {
    Launched {
        package: String,
        data_uri: Option<String>,
    },
    Action {
        package: String,
        screen: String,
        node: NodeId,
        action: NodeAction,
        acknowledged: bool,
    },
    Back {
        package: String,
        screen: String,
    },
}

#[derive(Debug)]
struct Foreground {
    app: usize,
    screen: usize,
    pending_polls: u32,
    focused: Option<NodeId>,
    texts: HashMap<NodeId, String>,
}

#[derive(Debug, Default)]
struct DeviceState {
    foreground: Option<Foreground>,
    generation: TreeGeneration,
    journal: Vec<JournalEntry>,
}

pub struct ScriptedDevice {
    scene: DeviceScene,
    state: Mutex<DeviceState>,
}

impl ScriptedDevice {
    pub fn new(scene: DeviceScene) -> Self {
        Self {
            scene,
            state: Mutex::new(DeviceState::default()),
        }
    }

    pub fn scene(&self) -> &DeviceScene {
        &self.scene
    }

    pub fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().journal.clone()
    }

    pub fn launched_packages(&self) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Launched { package, .. } => Some(package.clone()),
                _ => None,
            })
            .collect()
    }

    /// Set-text actions dispatched while `package` was in the foreground.
    pub fn set_text_calls(&self, package: &str) -> Vec<String> {
        self.state
            .lock()
            .journal
            .iter()
            .filter_map(|entry| match entry {
                JournalEntry::Action {
                    package: p,
                    action: NodeAction::SetText(text),
                    ..
                } if p == package => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// `(package, screen)` currently in the foreground.
    pub fn foreground(&self) -> Option<(String, String)> {
        let state = self.state.lock();
        let fg = state.foreground.as_ref()?;
        let app = &self.scene.apps[fg.app];
        let screen = app
            .screens
            .get(fg.screen)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        Some((app.package.clone(), screen))
    }

    /// Current text of a node on the foreground screen, including injected text.
    pub fn field_text(&self, node: NodeId) -> Option<String> {
        let state = self.state.lock();
        let fg = state.foreground.as_ref()?;
        if let Some(text) = fg.texts.get(&node) {
            return Some(text.clone());
        }
        let screen = self.scene.apps[fg.app].screens.get(fg.screen)?;
        screen.root.find(node, &mut 0)?.attrs.text.clone()
    }

    fn app_index(&self, package: &str) -> Option<usize> {
        self.scene.apps.iter().position(|app| app.package == package)
    }

    fn show_screen(&self, state: &mut DeviceState, app: usize, screen: usize) {
        let pending_polls = self.scene.apps[app]
            .screens
            .get(screen)
            .map(|s| s.loading_polls)
            .unwrap_or(0);
        state.generation = state.generation.next();
        state.foreground = Some(Foreground {
            app,
            screen,
            pending_polls,
            focused: None,
            texts: HashMap::new(),
        });
    }

    fn screen_index(&self, app: usize, name: &str) -> Option<usize> {
        self.scene.apps[app]
            .screens
            .iter()
            .position(|screen| screen.name == name)
    }
}

#[async_trait]
impl AccessibilityPort for ScriptedDevice {
    async fn current_tree(&self) -> Result<Option<UiTree>, PlatformError> {
        let mut state = self.state.lock();
        let generation = state.generation;
        let Some(fg) = state.foreground.as_mut() else {
            return Ok(None);
        };
        let app = &self.scene.apps[fg.app];
        if app.fail_tree_reads {
            return Err(PlatformError::Internal(format!(
                "{}: window content unavailable",
                app.package
            )));
        }
        if fg.pending_polls > 0 {
            fg.pending_polls -= 1;
            return Ok(None);
        }
        let Some(screen) = app.screens.get(fg.screen) else {
            return Ok(None);
        };
        let spec = screen.root.to_spec(&mut 0, &fg.texts);
        Ok(Some(UiTree::from_spec(generation, &spec)))
    }

    async fn perform(
        &self,
        node: &NodeHandle,
        action: NodeAction,
    ) -> Result<bool, PlatformError> {
        let mut state = self.state.lock();
        if node.generation != state.generation {
            return Err(PlatformError::StaleNode(*node));
        }
        let Some(fg) = state.foreground.as_mut() else {
            return Err(PlatformError::Unavailable("no foreground window".into()));
        };
        let app_idx = fg.app;
        let app = &self.scene.apps[app_idx];
        let screen = app
            .screens
            .get(fg.screen)
            .ok_or_else(|| PlatformError::NotFound(format!("node {}", node)))?;
        let target = screen
            .root
            .find(node.id, &mut 0)
            .ok_or_else(|| PlatformError::NotFound(format!("node {}", node)))?;

        let mut transition = None;
        let acknowledged = match &action {
            NodeAction::Click => {
                let ack = target.attrs.clickable || target.attrs.editable;
                if ack {
                    if target.attrs.focusable || target.attrs.editable {
                        fg.focused = Some(node.id);
                    }
                    transition = target.on_click.clone();
                }
                ack
            }
            NodeAction::Focus => {
                let ack = target.attrs.focusable;
                if ack {
                    fg.focused = Some(node.id);
                }
                ack
            }
            NodeAction::SetText(text) => {
                let ack = target.attrs.editable
                    && target.attrs.enabled
                    && match target.set_text {
                        SetTextBehavior::Accept => true,
                        SetTextBehavior::Reject => false,
                        SetTextBehavior::RequiresFocus => fg.focused == Some(node.id),
                        SetTextBehavior::PerCharacter => {
                            let current = fg.texts.get(&node.id).map(String::as_str).unwrap_or("");
                            text.is_empty()
                                || (text.starts_with(current)
                                    && text.chars().count() == current.chars().count() + 1)
                        }
                    };
                if ack {
                    fg.texts.insert(node.id, text.clone());
                }
                ack
            }
        };

        let package = app.package.clone();
        let screen_name = screen.name.clone();
        debug!(
            package = %package,
            screen = %screen_name,
            node = %node,
            action = action.label(),
            acknowledged,
            "scripted action"
        );
        state.journal.push(JournalEntry::Action {
            package,
            screen: screen_name,
            node: node.id,
            action,
            acknowledged,
        });

        if let Some(next) = transition {
            if let Some(screen_idx) = self.screen_index(app_idx, &next) {
                self.show_screen(&mut state, app_idx, screen_idx);
            }
        }
        Ok(acknowledged)
    }

    async fn global_back(&self) -> Result<bool, PlatformError> {
        let mut state = self.state.lock();
        let Some(fg) = state.foreground.as_ref() else {
            return Ok(false);
        };
        let app_idx = fg.app;
        let app = &self.scene.apps[app_idx];
        let screen = app.screens.get(fg.screen);
        let next = screen
            .and_then(|s| s.on_back.as_deref())
            .and_then(|name| self.screen_index(app_idx, name));
        state.journal.push(JournalEntry::Back {
            package: app.package.clone(),
            screen: screen.map(|s| s.name.clone()).unwrap_or_default(),
        });
        if let Some(screen_idx) = next {
            self.show_screen(&mut state, app_idx, screen_idx);
        }
        Ok(true)
    }
}

#[async_trait]
impl AppLifecyclePort for ScriptedDevice {
    async fn is_installed(&self, package: &str) -> Result<bool, PlatformError> {
        Ok(self
            .app_index(package)
            .map(|idx| self.scene.apps[idx].installed)
            .unwrap_or(false))
    }

    async fn launch_intent(&self, package: &str) -> Result<Option<LaunchIntent>, PlatformError> {
        Ok(self.app_index(package).and_then(|idx| {
            let app = &self.scene.apps[idx];
            (app.installed && app.launchable).then(|| LaunchIntent::for_package(package))
        }))
    }

    async fn start_activity(&self, intent: &LaunchIntent) -> Result<(), PlatformError> {
        let idx = self
            .app_index(&intent.package)
            .filter(|idx| self.scene.apps[*idx].installed)
            .ok_or_else(|| PlatformError::NotFound(intent.package.clone()))?;
        let mut state = self.state.lock();
        self.show_screen(&mut state, idx, 0);
        state.journal.push(JournalEntry::Launched {
            package: intent.package.clone(),
            data_uri: intent.data_uri.clone(),
        });
        Ok(())
    }
}
