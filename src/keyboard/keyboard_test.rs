// Synthetic output tests
//
// Note: Actual input simulation requires an active display (and Accessibility
// permission on macOS), so those tests are marked #[ignore].

use super::*;

#[test]
fn test_key_mapping() {
    assert_eq!(enigo_key(SynthKey::Backspace), Key::Backspace);
    assert_eq!(enigo_key(SynthKey::Enter), Key::Return);
    assert_eq!(enigo_key(SynthKey::Shift), Key::Shift);
}

#[test]
fn test_button_mapping() {
    assert_eq!(enigo_button(MouseButton::Left), Button::Left);
    assert_eq!(enigo_button(MouseButton::Right), Button::Right);
    assert_eq!(enigo_button(MouseButton::Middle), Button::Middle);
}

#[test]
#[ignore] // Requires display and input permissions
fn test_factory_opens_output_integration() {
    let mut output = EnigoFactory.open().expect("Failed to open output");
    let result = output.release(SynthKey::Shift);
    assert!(result.is_ok(), "Shift release should succeed: {:?}", result);
}
