use std::num::NonZeroU32;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoopProxy};
use winit::window::{Window, WindowId};
use softbuffer::Surface;

use crate::critique::{spawn_critique, CritiqueClient};
use crate::loader::UserEvent;
use crate::ui::state::{AppState, Effect, LINE_DELTA_PX};

pub mod layout;
pub mod render;
pub mod state;
pub mod viewer;

// ---------------------------------------------------------------------------
// Application handler (winit 0.30 style)
// ---------------------------------------------------------------------------

pub struct App {
    pub state: AppState,
    pub critic: Arc<CritiqueClient>,
    pub proxy: EventLoopProxy<UserEvent>,
    pub window: Option<Arc<Window>>,
    pub context: Option<softbuffer::Context<Arc<Window>>>,
    pub surface: Option<Surface<Arc<Window>, Arc<Window>>>,
}

impl App {
    pub fn new(state: AppState, critic: Arc<CritiqueClient>, proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            state,
            critic,
            proxy,
            window: None,
            context: None,
            surface: None,
        }
    }

    fn request_redraw(&self) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn perform(&self, effect: Option<Effect>) {
        if let Some(Effect::RequestCritique { index, url }) = effect {
            spawn_critique(Arc::clone(&self.critic), index, url, self.proxy.clone());
        }
    }
}

/// Converts a wheel event to browser convention: pixels, positive when scrolling down.
fn wheel_delta_y(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_DELTA_PX,
        MouseScrollDelta::PixelDelta(PhysicalPosition { y, .. }) => -y as f32,
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let attrs = Window::default_attributes()
            .with_title(format!("{} - Portfolio", self.state.owner))
            .with_inner_size(LogicalSize::new(1280u32, 800u32));
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Could not create window: {}", e);
                event_loop.exit();
                return;
            }
        };
        let context = match softbuffer::Context::new(Arc::clone(&window)) {
            Ok(context) => context,
            Err(e) => {
                log::error!("Could not create drawing context: {}", e);
                event_loop.exit();
                return;
            }
        };
        let surface = match Surface::new(&context, Arc::clone(&window)) {
            Ok(surface) => surface,
            Err(e) => {
                log::error!("Could not create drawing surface: {}", e);
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.state.on_resize(size.width as f32, size.height as f32);
        window.request_redraw();
        self.window = Some(window);
        self.context = Some(context);
        self.surface = Some(surface);
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ImageReady(idx) => {
                if self.state.viewer.selected() == Some(idx) {
                    self.request_redraw();
                }
            }
            UserEvent::ThumbnailReady(idx) => {
                if self.state.thumbnail_visible(idx) {
                    self.request_redraw();
                }
            }
            UserEvent::CritiqueReady { index, critique } => {
                log::debug!("[critique] entry {} ready: {}", index + 1, critique.is_some());
                self.state.on_critique(index, critique);
                self.request_redraw();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }

            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let (Some(surface), Some(w), Some(h)) = (
                    self.surface.as_mut(),
                    NonZeroU32::new(width),
                    NonZeroU32::new(height),
                ) {
                    if let Err(e) = surface.resize(w, h) {
                        log::warn!("Could not resize surface: {}", e);
                    }
                }
                self.state.on_resize(width as f32, height as f32);
                self.request_redraw();
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state == ElementState::Pressed {
                    let effect = self.state.on_key(&event.logical_key, event.text.as_deref());
                    self.perform(effect);
                    self.request_redraw();
                }
            }

            WindowEvent::MouseInput { state, button, .. } => {
                if button == MouseButton::Left {
                    let (x, y) = self.state.mouse_pos;
                    if state == ElementState::Pressed {
                        let effect = self.state.on_pointer_down(x, y);
                        self.perform(effect);
                    } else {
                        self.state.on_pointer_up();
                    }
                    self.request_redraw();
                }
            }

            WindowEvent::CursorMoved {
                position: PhysicalPosition { x, y },
                ..
            } => {
                self.state.on_pointer_move(x as f32, y as f32);
                self.request_redraw();
            }

            WindowEvent::CursorLeft { .. } => {
                self.state.on_cursor_left();
                self.request_redraw();
            }

            WindowEvent::MouseWheel { delta, .. } => {
                self.state.on_wheel(wheel_delta_y(delta));
                self.request_redraw();
            }

            WindowEvent::RedrawRequested => {
                let Some(window) = self.window.as_ref() else { return };
                window.set_cursor(self.state.cursor());

                if let Some(ref mut surface) = self.surface {
                    let size = window.inner_size();
                    let fb_w = size.width.max(1);
                    let fb_h = size.height.max(1);
                    match surface.buffer_mut() {
                        Ok(mut buffer) => {
                            self.state.render(&mut buffer, fb_w, fb_h);
                            if let Err(e) = buffer.present() {
                                log::warn!("Could not present frame: {}", e);
                            }
                        }
                        Err(e) => log::warn!("Could not acquire frame buffer: {}", e),
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}
