use iced::mouse;
use iced::touch;
use iced::widget::canvas::{self, event, Event, Frame, Geometry, Path, Stroke};
use iced::{Color, Point, Rectangle, Renderer, Theme};

use crate::gui::style::{AMBER, DIM};
use crate::gui::types::Message;

/// The rotary volume control. Reports pointer positions relative to its center while dragged.
pub struct Knob {
    pub angle: f32,
}

#[derive(Default)]
pub struct KnobInteraction {
    dragging: bool,
}

fn turned(position: Point, center: Point) -> Option<Message> {
    Some(Message::KnobTurned {
        dx: position.x - center.x,
        dy: position.y - center.y,
    })
}

impl canvas::Program<Message> for Knob {
    type State = KnobInteraction;

    fn update(
        &self,
        state: &mut KnobInteraction,
        event: Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> (event::Status, Option<Message>) {
        let center = bounds.center();

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) if cursor.is_over(bounds) => {
                state.dragging = true;
                (event::Status::Captured, None)
            },
            Event::Mouse(mouse::Event::CursorMoved { position }) if state.dragging => {
                (event::Status::Captured, turned(position, center))
            },
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left)) if state.dragging => {
                state.dragging = false;
                (event::Status::Captured, None)
            },
            Event::Touch(touch::Event::FingerPressed { position, .. }) if bounds.contains(position) => {
                state.dragging = true;
                (event::Status::Captured, None)
            },
            Event::Touch(touch::Event::FingerMoved { position, .. }) if state.dragging => {
                (event::Status::Captured, turned(position, center))
            },
            Event::Touch(touch::Event::FingerLifted { .. } | touch::Event::FingerLost { .. }) => {
                state.dragging = false;
                (event::Status::Ignored, None)
            },
            _ => (event::Status::Ignored, None),
        }
    }

    fn draw(
        &self,
        _state: &KnobInteraction,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        let center = frame.center();
        let radius = frame.width().min(frame.height()) / 2.0 - 4.0;

        frame.fill(&Path::circle(center, radius), Color { r: 0.16, g: 0.16, b: 0.16, a: 1.0 });
        frame.stroke(&Path::circle(center, radius), Stroke::default().with_color(DIM).with_width(2.0));

        let angle = self.angle.to_radians();
        let tip = Point::new(
            center.x + angle.cos() * radius * 0.8,
            center.y + angle.sin() * radius * 0.8,
        );
        frame.stroke(&Path::line(center, tip), Stroke::default().with_color(AMBER).with_width(4.0));

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(&self, state: &KnobInteraction, bounds: Rectangle, cursor: mouse::Cursor) -> mouse::Interaction {
        if state.dragging {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }
}
