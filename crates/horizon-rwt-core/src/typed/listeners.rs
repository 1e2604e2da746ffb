//! Strongly-typed listener interfaces.
//!
//! Every method has an empty default body, so an implementation only needs to
//! override the callbacks it cares about. Single-method interfaces are also
//! implemented for matching closures.

use super::events::*;

pub trait ActivateListener: Send + Sync {
    fn activated(&self, _event: &mut ActivateEvent) {}
    fn deactivated(&self, _event: &mut ActivateEvent) {}
}

pub trait ArmListener: Send + Sync {
    fn widget_armed(&self, event: &mut ArmEvent);
}

pub trait ControlListener: Send + Sync {
    fn control_moved(&self, _event: &mut ControlEvent) {}
    fn control_resized(&self, _event: &mut ControlEvent) {}
}

pub trait DisposeListener: Send + Sync {
    fn widget_disposed(&self, event: &mut DisposeEvent);
}

pub trait DragDetectListener: Send + Sync {
    fn drag_detected(&self, event: &mut DragDetectEvent);
}

/// Expand-bar style expansion of an item.
pub trait ExpandListener: Send + Sync {
    fn item_expanded(&self, _event: &mut ExpandEvent) {}
    fn item_collapsed(&self, _event: &mut ExpandEvent) {}
}

pub trait FocusListener: Send + Sync {
    fn focus_gained(&self, _event: &mut FocusEvent) {}
    fn focus_lost(&self, _event: &mut FocusEvent) {}
}

pub trait HelpListener: Send + Sync {
    fn help_requested(&self, event: &mut HelpEvent);
}

pub trait KeyListener: Send + Sync {
    fn key_pressed(&self, _event: &mut KeyEvent) {}
    fn key_released(&self, _event: &mut KeyEvent) {}
}

pub trait MenuDetectListener: Send + Sync {
    fn menu_detected(&self, event: &mut MenuDetectEvent);
}

pub trait MenuListener: Send + Sync {
    fn menu_shown(&self, _event: &mut MenuEvent) {}
    fn menu_hidden(&self, _event: &mut MenuEvent) {}
}

pub trait ModifyListener: Send + Sync {
    fn modify_text(&self, event: &mut ModifyEvent);
}

pub trait MouseListener: Send + Sync {
    fn mouse_double_click(&self, _event: &mut MouseEvent) {}
    fn mouse_down(&self, _event: &mut MouseEvent) {}
    fn mouse_up(&self, _event: &mut MouseEvent) {}
}

pub trait MouseMoveListener: Send + Sync {
    fn mouse_move(&self, event: &mut MouseEvent);
}

pub trait MouseTrackListener: Send + Sync {
    fn mouse_enter(&self, _event: &mut MouseEvent) {}
    fn mouse_exit(&self, _event: &mut MouseEvent) {}
    fn mouse_hover(&self, _event: &mut MouseEvent) {}
}

pub trait MouseWheelListener: Send + Sync {
    fn mouse_scrolled(&self, event: &mut MouseEvent);
}

pub trait PaintListener: Send + Sync {
    fn paint_control(&self, event: &mut PaintEvent);
}

pub trait SelectionListener: Send + Sync {
    fn widget_selected(&self, _event: &mut SelectionEvent) {}
    fn widget_default_selected(&self, _event: &mut SelectionEvent) {}
}

pub trait ShellListener: Send + Sync {
    fn shell_activated(&self, _event: &mut ShellEvent) {}
    /// Clearing `doit` keeps the shell open.
    fn shell_closed(&self, _event: &mut ShellEvent) {}
    fn shell_deactivated(&self, _event: &mut ShellEvent) {}
    fn shell_deiconified(&self, _event: &mut ShellEvent) {}
    fn shell_iconified(&self, _event: &mut ShellEvent) {}
}

pub trait TraverseListener: Send + Sync {
    fn key_traversed(&self, event: &mut TraverseEvent);
}

/// Tree style expansion of a node.
pub trait TreeListener: Send + Sync {
    fn tree_expanded(&self, _event: &mut TreeEvent) {}
    fn tree_collapsed(&self, _event: &mut TreeEvent) {}
}

pub trait VerifyListener: Send + Sync {
    /// Replace `text` or clear `doit` to alter or veto the modification.
    fn verify_text(&self, event: &mut VerifyEvent);
}

macro_rules! closure_listener {
    ($($listener:ident :: $method:ident ( $event:ty );)*) => {
        $(
            impl<F> $listener for F
            where
                F: Fn(&mut $event) + Send + Sync,
            {
                fn $method(&self, event: &mut $event) {
                    self(event)
                }
            }
        )*
    };
}

closure_listener! {
    ArmListener::widget_armed(ArmEvent);
    DisposeListener::widget_disposed(DisposeEvent);
    DragDetectListener::drag_detected(DragDetectEvent);
    HelpListener::help_requested(HelpEvent);
    MenuDetectListener::menu_detected(MenuDetectEvent);
    ModifyListener::modify_text(ModifyEvent);
    MouseMoveListener::mouse_move(MouseEvent);
    MouseWheelListener::mouse_scrolled(MouseEvent);
    PaintListener::paint_control(PaintEvent);
    TraverseListener::key_traversed(TraverseEvent);
    VerifyListener::verify_text(VerifyEvent);
}
